use mingle_core::{
    AtomicTypeRef, CoreType, Identifier, List, ListTypeRef, QualifiedTypeName, RangeRestriction,
    Restriction, Struct, SymbolMap, TypeRef, Value,
};
use time::macros::datetime;

#[test]
fn timestamp_ranges_compare_instants() -> eyre::Result<()> {
    mingle_testhelpers::setup();

    let r = Restriction::Range(RangeRestriction::new(
        Some(Value::from(datetime!(2020-01-01 00:00 UTC))),
        true,
        Some(Value::from(datetime!(2021-01-01 00:00 UTC))),
        false,
    ));
    assert!(r.accepts_value(&Value::from(datetime!(2020-06-01 12:00 UTC))));
    assert!(r.accepts_value(&Value::from(datetime!(2020-01-01 00:00 UTC))));
    assert!(!r.accepts_value(&Value::from(datetime!(2021-01-01 00:00 UTC))));
    assert_eq!(
        r.to_string(),
        "[2020-01-01T00:00:00Z,2021-01-01T00:00:00Z)"
    );

    Ok(())
}

#[test]
fn float_ranges_reject_nan() -> eyre::Result<()> {
    mingle_testhelpers::setup();

    let r = RangeRestriction::new(Some(Value::Float64(0.0)), false, None, false);
    assert!(r.accepts_value(&Value::Float64(0.5)));
    assert!(!r.accepts_value(&Value::Float64(0.0)));
    assert!(!r.accepts_value(&Value::Float64(f64::NAN)));

    Ok(())
}

#[test]
fn nested_values_report_their_types() -> eyre::Result<()> {
    mingle_testhelpers::setup();

    let qn = QualifiedTypeName::parse("ns1@v1/Struct1")?;
    let ints = ListTypeRef::new(TypeRef::core(CoreType::Int32), true);
    let fields = SymbolMap::from_pairs([
        (Identifier::new("f1")?, Value::Int32(1)),
        (
            Identifier::new("f2")?,
            Value::from(List::new(ints.clone(), vec![Value::Int32(1), Value::Int32(2)])),
        ),
    ])?;
    let v = Value::from(Struct::new(qn.clone(), fields));

    assert_eq!(v.type_of(), TypeRef::atomic(qn));
    let Value::Struct(s) = &v else {
        panic!("expected a struct, got {v}");
    };
    assert_eq!(s.fields().get("f2").map(Value::type_of), Some(TypeRef::List(ints)));
    assert_eq!(v.to_string(), "ns1@v1/Struct1{f1:1, f2:[1, 2]}");

    let restricted = AtomicTypeRef::restricted(
        CoreType::Int32.qname(),
        Restriction::Range(RangeRestriction::new(None, false, Some(Value::Int32(5)), true)),
    );
    assert_eq!(restricted.to_string(), "mingle:core@v1/Int32~(,5]");
    assert_eq!(restricted.core_type(), Some(CoreType::Int32));

    Ok(())
}
