//! RAML 1.0 document writer
//!
//!     Path parameters are first moved to the resource whose segment mentions them. The
//!     document is then written top-down; annotation types are written last, once every
//!     annotation in the document has been seen, and placed after `types`.

use super::methods::{write_is, write_secured_by};
use super::types::write_type;
use super::Writer;
use apiconv::annotations::{self, oas};
use apiconv::ir::{Annotation, AnnotationType, AnnotationValue, Document, Resource, TemplateRef};
use apiconv::tree::{join, put, put_list, put_map, Map};
use apiconv::{propagate, ConvertError, Exported};
use serde_json::{json, Value};
use tracing::debug;

pub fn export_document(doc: &Document) -> Result<Exported, ConvertError> {
    let doc = propagate(doc.clone());
    let mut writer = Writer::new(&doc.annotation_types);

    let mut head = Map::new();
    head.insert("title".to_string(), json!(doc.title));
    put(&mut head, "description", doc.description.clone());
    put(&mut head, "version", doc.version.clone());
    put(&mut head, "baseUri", doc.base_uri.clone());
    let base_parameters = writer.write_parameters(&doc.base_uri_parameters, "/baseUriParameters");
    put_map(&mut head, "baseUriParameters", base_parameters);
    put_list(&mut head, "protocols", &doc.protocols);
    match doc.media_types.merged().as_slice() {
        [] => {}
        [single] => {
            head.insert("mediaType".to_string(), json!(single));
        }
        many => {
            head.insert("mediaType".to_string(), json!(many));
        }
    }
    if !doc.documentation.is_empty() {
        let items = doc
            .documentation
            .iter()
            .map(|item| json!({"title": item.title, "content": item.content}))
            .collect();
        head.insert("documentation".to_string(), Value::Array(items));
    }

    let mut schemes = Map::new();
    for scheme in &doc.security_schemes {
        let at = join("/securitySchemes", &scheme.name);
        schemes.insert(scheme.name.clone(), writer.write_security_scheme(scheme, &at));
    }
    put_map(&mut head, "securitySchemes", schemes);
    put(&mut head, "securedBy", write_secured_by(doc.security.as_deref()));

    let mut types = Map::new();
    for entry in &doc.types {
        let at = join("/types", &entry.name);
        types.insert(entry.name.clone(), write_type(&entry.item, &mut writer.ctx, &at));
    }
    put_map(&mut head, "types", types);

    let mut tail = Map::new();
    let mut traits = Map::new();
    for fragment in &doc.traits {
        let at = join("/traits", &fragment.name);
        traits.insert(fragment.name.clone(), writer.write_trait(fragment, &at));
    }
    put_map(&mut tail, "traits", traits);
    let mut templates = Map::new();
    for template in &doc.resource_templates {
        let at = join("/resourceTypes", &template.name);
        templates.insert(template.name.clone(), writer.write_template(template, &at));
    }
    put_map(&mut tail, "resourceTypes", templates);

    let mut extra = doc.annotations.clone();
    if !doc.responses.is_empty() {
        let at = join("", &annotations::raml_key(oas::RESPONSES));
        let entries = doc
            .responses
            .iter()
            .map(|entry| {
                let value = writer.write_response(&entry.item, &join(&at, &entry.name));
                Annotation::from_json(entry.name.clone(), &value)
            })
            .collect();
        extra.push(Annotation::new(oas::RESPONSES, AnnotationValue::Map(entries)));
    }
    if !doc.parameters.is_empty() {
        debug!(
            count = doc.parameters.len(),
            "shared parameters no trait refers to are not written"
        );
    }
    annotations::export_into(&mut tail, &extra, &mut writer.ctx);

    for resource in &doc.resources {
        let at = join("", &resource.relative_path);
        let value = writer.write_resource(resource, &at);
        tail.insert(resource.relative_path.clone(), value);
    }

    let declarations: Vec<AnnotationType> = writer.ctx.annotation_types.declarations().to_vec();
    let mut declared = Map::new();
    for declaration in &declarations {
        let at = join("/annotationTypes", &declaration.name);
        declared.insert(
            declaration.name.clone(),
            writer.write_annotation_type(declaration, &at),
        );
    }

    let mut root = head;
    put_map(&mut root, "annotationTypes", declared);
    root.extend(tail);
    Ok(Exported {
        tree: Value::Object(root),
        warnings: writer.ctx.diagnostics,
    })
}

impl Writer {
    pub fn write_resource(&mut self, resource: &Resource, at: &str) -> Value {
        let mut map = Map::new();
        put(&mut map, "displayName", resource.display_name.clone());
        put(&mut map, "description", resource.description.clone());
        put(&mut map, "type", resource.template.as_ref().map(TemplateRef::to_json));
        put(&mut map, "is", write_is(&resource.traits));
        put(&mut map, "securedBy", write_secured_by(resource.security.as_deref()));
        let parameters = self.write_parameters(&resource.parameters, &join(at, "uriParameters"));
        put_map(&mut map, "uriParameters", parameters);
        annotations::export_into(&mut map, &resource.annotations, &mut self.ctx);
        for method in &resource.methods {
            let verb = method.verb.as_str();
            let value = self.write_method(method, &join(at, verb));
            map.insert(verb.to_string(), value);
        }
        for child in &resource.resources {
            let value = self.write_resource(child, &join(at, &child.relative_path));
            map.insert(child.relative_path.clone(), value);
        }
        if map.is_empty() {
            Value::Null
        } else {
            Value::Object(map)
        }
    }

    pub fn write_annotation_type(&mut self, declaration: &AnnotationType, at: &str) -> Value {
        let shape = write_type(&declaration.shape, &mut self.ctx, at);
        if declaration.allowed_targets.is_empty() {
            return shape;
        }
        let mut map = match shape {
            Value::Object(map) => map,
            expression => {
                let mut map = Map::new();
                map.insert("type".to_string(), expression);
                map
            }
        };
        put_list(&mut map, "allowedTargets", &declaration.allowed_targets);
        Value::Object(map)
    }
}
