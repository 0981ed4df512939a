//! Shared fixtures for integration tests
//!
//! A small sales schema (customers, orders, self-referencing addresses)
//! bound to hand-described application types.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use odata_client_metadata::{
    ClientMember, ClientModel, ClientModelBuilder, ClientModelOptions, ClientTypeBuilder,
    ClientTypeId, ClientValue, TypeUniverse,
};
use odata_edm::{EdmModel, EdmModelBuilder, EdmPrimitiveKind, EdmPropertyId, EdmTypeId, EdmTypeRef};

#[derive(Debug, Default)]
pub struct Address {
    pub city: String,
    pub next: Option<Arc<Address>>,
}

#[derive(Debug, Default)]
pub struct Customer {
    pub id: i32,
    pub name: String,
    pub address: Option<Arc<Address>>,
    pub orders: Vec<Arc<Order>>,
}

#[derive(Debug, Default)]
pub struct Order {
    pub order_id: i32,
    pub id: i32,
    pub total: f64,
    pub customer: Option<Arc<Customer>>,
}

#[derive(Debug, Default)]
pub struct Photo {
    pub id: i32,
    pub data: Option<String>,
    pub thumb: BTreeMap<String, ClientValue>,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct Document {
    pub id: i32,
    pub title: String,
    pub content: Vec<u8>,
    pub content_type: String,
}

pub struct Sales {
    pub universe: Arc<TypeUniverse>,
    pub edm: Arc<EdmModel>,
    pub model: ClientModel,

    pub customer: ClientTypeId,
    pub order: ClientTypeId,
    pub address: ClientTypeId,
    pub photo: ClientTypeId,
    pub document: ClientTypeId,

    pub customer_schema: EdmTypeId,
    pub order_schema: EdmTypeId,
    pub address_schema: EdmTypeId,
    pub photo_schema: EdmTypeId,
    pub document_schema: EdmTypeId,

    pub customer_orders: EdmPropertyId,
    pub order_customer: EdmPropertyId,
}

fn register_types(universe: &TypeUniverse) -> [ClientTypeId; 5] {
    let int = universe.primitive(EdmPrimitiveKind::Int32);
    let double = universe.primitive(EdmPrimitiveKind::Double);
    let string = universe.primitive(EdmPrimitiveKind::String);
    let binary = universe.primitive(EdmPrimitiveKind::Binary);

    let customer = universe.reserve();
    let order = universe.reserve();
    let address = universe.reserve();

    universe
        .define(
            address,
            ClientTypeBuilder::class("Sales.Address")
                .member(ClientMember::new("City", string).field(|a: &Address| &a.city, |a: &mut Address| &mut a.city))
                .member(ClientMember::new("Next", address).field(|a: &Address| &a.next, |a: &mut Address| &mut a.next)),
        )
        .unwrap();

    universe
        .define(
            order,
            ClientTypeBuilder::class("Sales.Order")
                .member(ClientMember::new("OrderID", int).field(|o: &Order| &o.order_id, |o: &mut Order| &mut o.order_id))
                .member(ClientMember::new("ID", int).field(|o: &Order| &o.id, |o: &mut Order| &mut o.id))
                .member(ClientMember::new("Total", double).field(|o: &Order| &o.total, |o: &mut Order| &mut o.total))
                .member(
                    ClientMember::new("Customer", customer)
                        .field(|o: &Order| &o.customer, |o: &mut Order| &mut o.customer),
                ),
        )
        .unwrap();

    // the list shape needs Order defined first
    let orders = universe.list_of(order).unwrap();
    universe
        .define(
            customer,
            ClientTypeBuilder::class("Sales.Customer")
                .key(["Id"])
                .member(ClientMember::new("Id", int).field(|c: &Customer| &c.id, |c: &mut Customer| &mut c.id))
                .member(ClientMember::new("Name", string).field(|c: &Customer| &c.name, |c: &mut Customer| &mut c.name))
                .member(
                    ClientMember::new("Address", address)
                        .field(|c: &Customer| &c.address, |c: &mut Customer| &mut c.address),
                )
                .member(
                    ClientMember::new("Orders", orders)
                        .collection(|c: &Customer| &c.orders, |c: &mut Customer| &mut c.orders),
                ),
        )
        .unwrap();

    let thumbs = universe.map_of(string).unwrap();
    let photo = universe.register(
        ClientTypeBuilder::class("Sales.Photo")
            .key(["Id"])
            .member(ClientMember::new("Id", int).field(|p: &Photo| &p.id, |p: &mut Photo| &mut p.id))
            .member(
                ClientMember::new("Data", universe.stream_link())
                    .field(|p: &Photo| &p.data, |p: &mut Photo| &mut p.data),
            )
            .member(
                ClientMember::new("Thumb", thumbs)
                    .dictionary(|p: &Photo| &p.thumb, |p: &mut Photo| &mut p.thumb),
            )
            .member(ClientMember::new("Name", string).field(|p: &Photo| &p.name, |p: &mut Photo| &mut p.name)),
    );

    let document = universe.register(
        ClientTypeBuilder::class("Sales.Document")
            .key(["Id"])
            .media_entry("Content")
            .mime_type("Content", "ContentType")
            .member(ClientMember::new("Id", int).field(|d: &Document| &d.id, |d: &mut Document| &mut d.id))
            .member(ClientMember::new("Title", string).field(|d: &Document| &d.title, |d: &mut Document| &mut d.title))
            .member(
                ClientMember::new("Content", binary)
                    .field(|d: &Document| &d.content, |d: &mut Document| &mut d.content),
            )
            .member(
                ClientMember::new("ContentType", string)
                    .field(|d: &Document| &d.content_type, |d: &mut Document| &mut d.content_type),
            ),
    );

    [customer, order, address, photo, document]
}

pub fn sales() -> Sales {
    sales_with(ClientModelOptions::default())
}

pub fn sales_with(options: ClientModelOptions) -> Sales {
    let universe = Arc::new(TypeUniverse::new());
    let [customer, order, address, photo, document] = register_types(&universe);

    let int = EdmTypeRef::primitive(EdmPrimitiveKind::Int32, false);
    let text = EdmTypeRef::primitive(EdmPrimitiveKind::String, true);

    let mut builder = EdmModelBuilder::new("Sales");
    let customer_schema = builder.entity_type("Customer").unwrap();
    let order_schema = builder.entity_type("Order").unwrap();
    let address_schema = builder.complex_type("Address").unwrap();
    let photo_schema = builder.entity_type("Photo").unwrap();
    let document_schema = builder.entity_type("Document").unwrap();

    builder.structural_property(address_schema, "City", text.clone()).unwrap();
    builder
        .structural_property(address_schema, "Next", EdmTypeRef::named(address_schema, true))
        .unwrap();

    builder.set_key(customer_schema, ["Id"]).unwrap();
    builder.structural_property(customer_schema, "Id", int.clone()).unwrap();
    builder.structural_property(customer_schema, "Name", text.clone()).unwrap();
    builder
        .structural_property(customer_schema, "Address", EdmTypeRef::named(address_schema, true))
        .unwrap();
    let customer_orders = builder
        .navigation_property(
            customer_schema,
            "Orders",
            EdmTypeRef::collection(EdmTypeRef::named(order_schema, false)),
        )
        .unwrap();

    builder.set_key(order_schema, ["OrderID"]).unwrap();
    builder.structural_property(order_schema, "OrderID", int.clone()).unwrap();
    builder.structural_property(order_schema, "ID", int.clone()).unwrap();
    builder
        .structural_property(order_schema, "Total", EdmTypeRef::primitive(EdmPrimitiveKind::Double, false))
        .unwrap();
    let order_customer = builder
        .navigation_property(order_schema, "Customer", EdmTypeRef::named(customer_schema, true))
        .unwrap();
    builder.set_partners(customer_orders, order_customer).unwrap();

    builder.set_key(photo_schema, ["Id"]).unwrap();
    builder.structural_property(photo_schema, "Id", int.clone()).unwrap();
    builder
        .structural_property(photo_schema, "Data", EdmTypeRef::primitive(EdmPrimitiveKind::Stream, true))
        .unwrap();
    builder.structural_property(photo_schema, "Thumb", text.clone()).unwrap();
    builder.structural_property(photo_schema, "Name", text.clone()).unwrap();

    builder.set_key(document_schema, ["Id"]).unwrap();
    builder.structural_property(document_schema, "Id", int).unwrap();
    builder.structural_property(document_schema, "Title", text.clone()).unwrap();
    builder
        .structural_property(document_schema, "Content", EdmTypeRef::primitive(EdmPrimitiveKind::Binary, true))
        .unwrap();
    builder.structural_property(document_schema, "ContentType", text).unwrap();

    let edm = Arc::new(builder.build().unwrap());
    let model = ClientModelBuilder::new(edm.clone(), universe.clone())
        .options(options)
        .bind_by_name()
        .build()
        .unwrap();

    Sales {
        universe,
        edm,
        model,
        customer,
        order,
        address,
        photo,
        document,
        customer_schema,
        order_schema,
        address_schema,
        photo_schema,
        document_schema,
        customer_orders,
        order_customer,
    }
}
