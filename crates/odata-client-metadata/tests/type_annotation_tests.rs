//! Integration tests for per-type metadata
//!
//! Property collections, lookup policies, the serialization filter,
//! media-link detection, key properties and protocol version requirements.

mod common;

use std::sync::Arc;

use common::{sales, sales_with};
use odata_client_metadata::{
    ClientMember, ClientModelBuilder, ClientModelOptions, ClientPropertyAnnotation,
    ClientTypeBuilder, ClientTypeId, MetadataError, ProtocolVersion, TypeUniverse,
    UndeclaredPropertyBehavior,
};
use odata_edm::{EdmModel, EdmModelBuilder, EdmPrimitiveKind, EdmTypeId, EdmTypeRef};

fn names(properties: &[Arc<ClientPropertyAnnotation>]) -> Vec<String> {
    properties.iter().map(|p| p.name().to_string()).collect()
}

#[test]
fn test_properties_in_declaration_order() {
    let fx = sales();
    let customer = fx.model.type_annotation(fx.customer_schema).unwrap();

    assert_eq!(customer.name(), "Sales.Customer");
    assert!(customer.is_entity_type());
    assert_eq!(
        names(customer.properties(&fx.model).unwrap()),
        vec!["Id", "Name", "Address", "Orders"]
    );
}

#[test]
fn test_one_annotation_per_schema_element() {
    let fx = sales();
    let a = fx.model.type_annotation(fx.order_schema).unwrap();
    let b = fx.model.type_annotation_for(fx.order).unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    let first = a.properties(&fx.model).unwrap();
    let second = b.properties(&fx.model).unwrap();
    assert!(Arc::ptr_eq(&first[0], &second[0]));
}

#[test]
fn test_concurrent_first_requests_share_instances() {
    let fx = sales();

    let annotations: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                scope.spawn(|| {
                    let annotation = fx.model.type_annotation(fx.customer_schema).unwrap();
                    let first = annotation.properties(&fx.model).unwrap()[0].clone();
                    (annotation, first)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let (expected_type, expected_property) = &annotations[0];
    for (annotation, property) in &annotations {
        assert!(Arc::ptr_eq(annotation, expected_type));
        assert!(Arc::ptr_eq(property, expected_property));
    }
}

#[test]
fn test_get_property_policies() {
    let fx = sales();
    let customer = fx.model.type_annotation(fx.customer_schema).unwrap();

    let name = customer
        .get_property(&fx.model, "Name", UndeclaredPropertyBehavior::ThrowException)
        .unwrap();
    assert_eq!(name.map(|p| p.wire_name().to_string()), Some("Name".to_string()));

    match customer
        .get_property(&fx.model, "Nickname", UndeclaredPropertyBehavior::ThrowException)
        .unwrap_err()
    {
        MetadataError::MissingProperty { type_name, property } => {
            assert_eq!(type_name, "Sales.Customer");
            assert_eq!(property, "Nickname");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(customer
        .get_property(&fx.model, "Nickname", UndeclaredPropertyBehavior::Ignore)
        .unwrap()
        .is_none());
    assert!(customer
        .get_property(&fx.model, "Nickname", UndeclaredPropertyBehavior::Support)
        .unwrap()
        .is_none());
}

#[test]
fn test_model_get_property_uses_configured_policy() {
    let strict = sales();
    assert!(strict.model.get_property(strict.customer_schema, "Nickname").is_err());

    let lenient = sales_with(ClientModelOptions {
        undeclared_property_behavior: UndeclaredPropertyBehavior::Ignore,
        ..ClientModelOptions::default()
    });
    assert!(lenient
        .model
        .get_property(lenient.customer_schema, "Nickname")
        .unwrap()
        .is_none());
}

#[test]
fn test_renamed_member_lookup() {
    struct Item {
        label: String,
    }

    let universe = Arc::new(TypeUniverse::new());
    let string = universe.primitive(EdmPrimitiveKind::String);
    let item = universe.register(
        ClientTypeBuilder::class("Shop.Item").member(
            ClientMember::new("Label", string)
                .renamed_from("label_text")
                .field(|i: &Item| &i.label, |i: &mut Item| &mut i.label),
        ),
    );

    let mut builder = EdmModelBuilder::new("Shop");
    let item_schema = builder.complex_type("Item").unwrap();
    builder
        .structural_property(item_schema, "label_text", EdmTypeRef::primitive(EdmPrimitiveKind::String, true))
        .unwrap();
    let model = ClientModelBuilder::new(Arc::new(builder.build().unwrap()), universe)
        .bind(item_schema, item)
        .build()
        .unwrap();

    let annotation = model.type_annotation(item_schema).unwrap();
    let by_member = annotation
        .get_property(&model, "Label", UndeclaredPropertyBehavior::ThrowException)
        .unwrap()
        .unwrap();
    let by_wire = annotation
        .get_property(&model, "label_text", UndeclaredPropertyBehavior::ThrowException)
        .unwrap()
        .unwrap();
    assert!(Arc::ptr_eq(&by_member, &by_wire));
    assert_eq!(by_wire.wire_name(), "label_text");
}

#[test]
fn test_serialization_filter() {
    let fx = sales();
    let photo = fx.model.type_annotation(fx.photo_schema).unwrap();
    let keys = photo.key_properties(&fx.model).unwrap().unwrap();
    assert_eq!(names(keys), vec!["Id"]);

    let serialized = photo.properties_to_serialize(&fx.model).unwrap();
    assert_eq!(names(&serialized), vec!["Id", "Name"]);

    let non_key: Vec<_> = serialized
        .iter()
        .filter(|p| !keys.iter().any(|k| Arc::ptr_eq(k, p)))
        .map(|p| p.name().to_string())
        .collect();
    assert_eq!(non_key, vec!["Name"]);
}

#[test]
fn test_media_link_entry() {
    let fx = sales();
    let document = fx.model.type_annotation(fx.document_schema).unwrap();

    assert!(document.is_media_link_entry(&fx.model).unwrap());
    let data = document.media_data_member(&fx.model).unwrap().unwrap();
    assert_eq!(data.name(), "Content");
    assert_eq!(
        data.mime_type_property().map(|p| p.name().to_string()),
        Some("ContentType".to_string())
    );

    let serialized = document.properties_to_serialize(&fx.model).unwrap();
    assert_eq!(names(&serialized), vec!["Id", "Title"]);

    let customer = fx.model.type_annotation(fx.customer_schema).unwrap();
    assert!(!customer.is_media_link_entry(&fx.model).unwrap());
    assert!(customer.media_data_member(&fx.model).unwrap().is_none());
}

#[test]
fn test_has_stream_without_media_member() {
    struct Clip {
        id: i32,
    }

    let universe = Arc::new(TypeUniverse::new());
    let int = universe.primitive(EdmPrimitiveKind::Int32);
    let clip = universe.register(
        ClientTypeBuilder::class("Media.Clip")
            .member(ClientMember::new("Id", int).field(|c: &Clip| &c.id, |c: &mut Clip| &mut c.id)),
    );

    let mut builder = EdmModelBuilder::new("Media");
    let clip_schema = builder.entity_type("Clip").unwrap();
    builder.set_has_stream(clip_schema, true).unwrap();
    builder
        .structural_property(clip_schema, "Id", EdmTypeRef::primitive(EdmPrimitiveKind::Int32, false))
        .unwrap();
    let model = ClientModelBuilder::new(Arc::new(builder.build().unwrap()), universe)
        .bind(clip_schema, clip)
        .build()
        .unwrap();

    let annotation = model.type_annotation(clip_schema).unwrap();
    assert!(annotation.is_media_link_entry(&model).unwrap());
    assert!(annotation.media_data_member(&model).unwrap().is_none());
}

#[test]
fn test_missing_media_entry_property() {
    struct Blob {
        id: i32,
    }

    let universe = Arc::new(TypeUniverse::new());
    let int = universe.primitive(EdmPrimitiveKind::Int32);
    let blob = universe.register(
        ClientTypeBuilder::class("Media.Blob")
            .media_entry("Payload")
            .member(ClientMember::new("Id", int).field(|b: &Blob| &b.id, |b: &mut Blob| &mut b.id)),
    );

    let mut builder = EdmModelBuilder::new("Media");
    let blob_schema = builder.entity_type("Blob").unwrap();
    builder
        .structural_property(blob_schema, "Id", EdmTypeRef::primitive(EdmPrimitiveKind::Int32, false))
        .unwrap();
    let model = ClientModelBuilder::new(Arc::new(builder.build().unwrap()), universe)
        .bind(blob_schema, blob)
        .build()
        .unwrap();

    let annotation = model.type_annotation(blob_schema).unwrap();
    match annotation.is_media_link_entry(&model).unwrap_err() {
        MetadataError::MissingMediaEntryProperty { property, .. } => assert_eq!(property, "Payload"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_mime_type_property() {
    struct Note {
        body: String,
    }

    let universe = Arc::new(TypeUniverse::new());
    let string = universe.primitive(EdmPrimitiveKind::String);
    let note = universe.register(
        ClientTypeBuilder::class("Docs.Note")
            .mime_type("Body", "BodyType")
            .member(ClientMember::new("Body", string).field(|n: &Note| &n.body, |n: &mut Note| &mut n.body)),
    );

    let mut builder = EdmModelBuilder::new("Docs");
    let note_schema = builder.complex_type("Note").unwrap();
    builder
        .structural_property(note_schema, "Body", EdmTypeRef::primitive(EdmPrimitiveKind::String, true))
        .unwrap();
    let model = ClientModelBuilder::new(Arc::new(builder.build().unwrap()), universe)
        .bind(note_schema, note)
        .build()
        .unwrap();

    let annotation = model.type_annotation(note_schema).unwrap();
    assert!(matches!(
        annotation.properties(&model).unwrap_err(),
        MetadataError::MissingMimeTypeProperty { .. }
    ));
}

#[test]
fn test_schema_property_without_member() {
    struct Tag {
        name: String,
    }

    let universe = Arc::new(TypeUniverse::new());
    let string = universe.primitive(EdmPrimitiveKind::String);
    let tag = universe.register(
        ClientTypeBuilder::class("Docs.Tag")
            .member(ClientMember::new("Name", string).field(|t: &Tag| &t.name, |t: &mut Tag| &mut t.name)),
    );

    let mut builder = EdmModelBuilder::new("Docs");
    let tag_schema = builder.complex_type("Tag").unwrap();
    let text = EdmTypeRef::primitive(EdmPrimitiveKind::String, true);
    builder.structural_property(tag_schema, "Name", text.clone()).unwrap();
    builder.structural_property(tag_schema, "Color", text).unwrap();
    let model = ClientModelBuilder::new(Arc::new(builder.build().unwrap()), universe)
        .bind(tag_schema, tag)
        .build()
        .unwrap();

    let annotation = model.type_annotation(tag_schema).unwrap();
    match annotation.properties(&model).unwrap_err() {
        MetadataError::MissingProperty { type_name, property } => {
            assert_eq!(type_name, "Docs.Tag");
            assert_eq!(property, "Color");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_key_properties() {
    let fx = sales();

    let order = fx.model.type_annotation(fx.order_schema).unwrap();
    assert_eq!(names(order.key_properties(&fx.model).unwrap().unwrap()), vec!["OrderID"]);

    let customer = fx.model.type_annotation(fx.customer_schema).unwrap();
    assert_eq!(names(customer.key_properties(&fx.model).unwrap().unwrap()), vec!["Id"]);

    let address = fx.model.type_annotation(fx.address_schema).unwrap();
    assert!(address.key_properties(&fx.model).unwrap().is_none());
    assert!(!address.is_entity_type());
}

#[test]
fn test_required_version_with_cyclic_complex_type() {
    let fx = sales();

    // Customer -> Address -> Address (cycle) stays at the baseline
    let customer = fx.model.type_annotation(fx.customer_schema).unwrap();
    assert_eq!(customer.required_schema_version(&fx.model).unwrap(), ProtocolVersion::V1);

    let address = fx.model.type_annotation(fx.address_schema).unwrap();
    assert_eq!(address.required_schema_version(&fx.model).unwrap(), ProtocolVersion::V1);

    // stream link
    let photo = fx.model.type_annotation(fx.photo_schema).unwrap();
    assert_eq!(photo.required_schema_version(&fx.model).unwrap(), ProtocolVersion::V3);
}

#[derive(Default)]
struct Place {
    spot: Option<i64>,
    kind: Option<String>,
}

#[derive(Default)]
struct Venue {
    id: i32,
    place: Option<Arc<Place>>,
}

/// Venue -> Place, where Place carries a spatial and an enum property
fn geo_types(universe: &TypeUniverse) -> ClientTypeId {
    let int = universe.primitive(EdmPrimitiveKind::Int32);
    let point = universe.primitive(EdmPrimitiveKind::Geography);
    let kind = universe.register(ClientTypeBuilder::enumeration("Geo.PlaceKind"));
    let nullable_kind = universe.nullable(kind).unwrap();

    let place = universe.register(
        ClientTypeBuilder::class("Geo.Place")
            .member(ClientMember::new("Spot", point).field(|p: &Place| &p.spot, |p: &mut Place| &mut p.spot))
            .member(
                ClientMember::new("Kind", nullable_kind)
                    .field(|p: &Place| &p.kind, |p: &mut Place| &mut p.kind),
            ),
    );
    universe.register(
        ClientTypeBuilder::class("Geo.Venue")
            .member(ClientMember::new("Id", int).field(|v: &Venue| &v.id, |v: &mut Venue| &mut v.id))
            .member(ClientMember::new("Place", place).field(|v: &Venue| &v.place, |v: &mut Venue| &mut v.place)),
    )
}

fn geo_schema() -> (EdmModel, EdmTypeId) {
    let mut builder = EdmModelBuilder::new("Geo");
    let kind = builder.enum_type("PlaceKind").unwrap();
    let place = builder.complex_type("Place").unwrap();
    let venue = builder.entity_type("Venue").unwrap();
    builder
        .structural_property(place, "Spot", EdmTypeRef::primitive(EdmPrimitiveKind::Geography, true))
        .unwrap();
    builder
        .structural_property(place, "Kind", EdmTypeRef::named(kind, true))
        .unwrap();
    builder
        .structural_property(venue, "Id", EdmTypeRef::primitive(EdmPrimitiveKind::Int32, false))
        .unwrap();
    builder
        .structural_property(venue, "Place", EdmTypeRef::named(place, true))
        .unwrap();
    (builder.build().unwrap(), venue)
}

#[test]
fn test_required_version_from_nested_properties() {
    let universe = Arc::new(TypeUniverse::new());
    let venue = geo_types(&universe);

    let (edm, venue_schema) = geo_schema();
    let model = ClientModelBuilder::new(Arc::new(edm), universe.clone())
        .bind_by_name()
        .build()
        .unwrap();
    let annotation = model.type_annotation_for(venue).unwrap();
    assert_eq!(annotation.schema_type(), venue_schema);
    assert_eq!(annotation.required_schema_version(&model).unwrap(), ProtocolVersion::V4);
    assert_eq!(model.check_protocol_version(venue_schema).unwrap(), ProtocolVersion::V4);
}

#[test]
fn test_protocol_version_above_configured_maximum() {
    let universe = Arc::new(TypeUniverse::new());
    geo_types(&universe);

    let (edm, venue_schema) = geo_schema();
    let model = ClientModelBuilder::new(Arc::new(edm), universe)
        .options(ClientModelOptions {
            max_protocol_version: ProtocolVersion::V3,
            ..ClientModelOptions::default()
        })
        .bind_by_name()
        .build()
        .unwrap();

    match model.check_protocol_version(venue_schema).unwrap_err() {
        MetadataError::ProtocolVersionTooLow { type_name, required, max } => {
            assert_eq!(type_name, "Geo.Venue");
            assert_eq!(required, ProtocolVersion::V4);
            assert_eq!(max, ProtocolVersion::V3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unbound_schema_type() {
    let fx = sales();
    let mut builder = EdmModelBuilder::new("Other");
    let lone = builder.entity_type("Lone").unwrap();
    let model = ClientModelBuilder::new(Arc::new(builder.build().unwrap()), fx.universe.clone())
        .build()
        .unwrap();

    assert!(matches!(
        model.type_annotation(lone).unwrap_err(),
        MetadataError::UnboundSchemaType { .. }
    ));
    assert!(matches!(
        model.type_annotation_for(fx.customer).unwrap_err(),
        MetadataError::UnboundClientType { .. }
    ));
}

#[test]
fn test_binding_kind_mismatch() {
    let fx = sales();
    let mut builder = EdmModelBuilder::new("Other");
    let color = builder.enum_type("Color").unwrap();
    let err = ClientModelBuilder::new(Arc::new(builder.build().unwrap()), fx.universe.clone())
        .bind(color, fx.customer)
        .build()
        .unwrap_err();

    assert!(matches!(err, MetadataError::BindingKindMismatch { .. }));
}
