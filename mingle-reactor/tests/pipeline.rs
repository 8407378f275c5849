mod common;

use std::collections::HashMap;

use common::{TestSchema, id, qn};
use mingle_core::{CoreType, IdPath, ListTypeRef, Struct, SymbolMap, TypeRef, Value};
use mingle_reactor::{
    CastReactor, DebugReactor, EventSender, FieldOrderReactor, ReactorPipeline, StructuralReactor,
    TopType, ValueBuilder, visit_value_with_path,
};
use mingle_testhelpers::test;

#[test]
fn hand_sent_events_run_every_stage() {
    let schema = TestSchema::default().with_struct(
        "ns1@v1/Req",
        &[
            ("id", TypeRef::core(CoreType::Uint32)),
            ("tags", TypeRef::list_of(TypeRef::core(CoreType::String), false)),
        ],
    );
    let order = HashMap::from([(qn("ns1@v1/Req"), vec![id("id"), id("tags")])]);

    let mut vb = ValueBuilder::new();
    let mut pip = ReactorPipeline::builder()
        .pipeline_processor(StructuralReactor::new(TopType::Struct))
        .pipeline_processor(DebugReactor::new("in"))
        .pipeline_processor(FieldOrderReactor::new(order))
        .pipeline_processor(CastReactor::new(
            TypeRef::atomic(qn("ns1@v1/Req")),
            schema,
            IdPath::root(),
        ))
        .pipeline_processor(DebugReactor::new("out"))
        .event_processor(&mut vb)
        .build();

    EventSender::new(&mut pip)
        .start_struct(qn("ns1@v1/Req"))?
        .start_field(id("tags"))?
        .start_list(ListTypeRef::opaque())?
        .value("a")?
        .value(2i32)?
        .end()?
        .start_field(id("id"))?
        .value("7")?
        .end()?;
    drop(pip);

    let expect = Value::Struct(Struct::new(
        qn("ns1@v1/Req"),
        SymbolMap::from_pairs([
            (id("id"), Value::Uint32(7)),
            (
                id("tags"),
                Value::List(mingle_core::List::new(
                    ListTypeRef::new(TypeRef::core(CoreType::String), false),
                    vec![Value::from("a"), Value::from("2")],
                )),
            ),
        ])?,
    ));
    assert_eq!(vb.into_value()?, expect);
}

#[test]
fn top_type_is_enforced_ahead_of_casting() {
    let mut pip = ReactorPipeline::builder()
        .pipeline_processor(StructuralReactor::new(TopType::Struct))
        .pipeline_processor(CastReactor::with_default(TypeRef::value(), IdPath::root()))
        .build();
    let err = EventSender::new(&mut pip)
        .start_map()
        .err()
        .expect("maps are not structs here");
    assert_eq!(err.message(), "Expected struct but got map start");
}

#[test]
fn stamped_paths_start_under_the_given_path() {
    let v = Value::SymbolMap(SymbolMap::from_pairs([(id("f1"), Value::Int32(1))])?);
    let mut vb = ValueBuilder::new();
    let start = IdPath::root().descend(id("params"));
    visit_value_with_path(&v, start, &mut vb)?;
    assert_eq!(vb.into_value()?, v);
}
