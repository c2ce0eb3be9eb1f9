use std::rc::Rc;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use solfege::{
    array::Array,
    block::{Block, BlockRef},
    function::{Executable, Function},
    object::Object,
    value::{Value, ValueType},
};

fn num(n: i64) -> Value {
    Value::number(n)
}

fn dec(text: &str) -> Value {
    Value::Number(text.parse::<Decimal>().expect("decimal"))
}

fn sample_values() -> Vec<Value> {
    vec![
        Value::None,
        Value::Bool(true),
        num(3),
        Value::string("true"),
        Value::array(vec![num(1), Value::string("a")]),
        Value::object(Object::new("Thing")),
        Value::function(Function::native("f", &["x"], |args| Ok(args[0].clone()))),
    ]
}

#[test]
fn conversion_to_own_type_is_identity() {
    for value in sample_values() {
        let converted = value
            .convert_type(value.value_type())
            .expect("identity conversion");
        assert_eq!(converted, value);
    }
}

#[test]
fn conversion_goes_through_string_form() {
    assert_eq!(
        Value::string("true").convert_type(ValueType::Bool).expect("bool"),
        Value::Bool(true)
    );
    assert_eq!(
        Value::string("12.50").convert_type(ValueType::Number).expect("number"),
        dec("12.5")
    );
    assert_eq!(
        num(7).convert_type(ValueType::String).expect("string"),
        Value::string("7")
    );
    assert_eq!(
        Value::array(vec![num(1)]).convert_type(ValueType::None).expect("none"),
        Value::None
    );
    assert_eq!(
        Value::Bool(false).convert_type(ValueType::String).expect("string"),
        Value::string("false")
    );
}

#[test]
fn invalid_conversions_fail() {
    let cases = [
        (Value::string("yes"), ValueType::Bool),
        (num(1), ValueType::Bool),
        (Value::string("1.2.3"), ValueType::Number),
        (Value::string("x"), ValueType::Array),
        (num(1), ValueType::Object),
        (Value::None, ValueType::Function),
    ];
    for (value, target) in cases {
        let err = value.convert_type(target).expect_err("conversion should fail");
        assert!(err.to_string().contains("cannot convert"), "{err}");
    }
}

#[test]
fn display_forms() {
    assert_eq!(Value::None.to_string(), "none");
    assert_eq!(Value::Bool(false).to_string(), "false");
    assert_eq!(dec("2.50").to_string(), "2.5");
    assert_eq!(dec("-0").to_string(), "0");
    assert_eq!(dec("100").to_string(), "100");
    assert_eq!(Value::string("hi").to_string(), "hi");
    assert_eq!(
        Value::array(vec![num(1), Value::string("a"), Value::None]).to_string(),
        "[1, a, none]"
    );
    assert_eq!(Value::object(Object::new("Console")).to_string(), "object Console");
    let function = Function::native("Add", &["a", "b"], |_| Ok(Value::None));
    assert_eq!(Value::function(function).to_string(), "func Add(a, b)");
}

#[test]
fn equality_rules() {
    assert_eq!(Value::None, Value::None);
    assert_ne!(Value::None, Value::Bool(false));
    assert_ne!(num(1), Value::string("1"));
    assert_eq!(dec("1.0"), num(1));
    assert_eq!(
        Value::array(vec![num(1), num(2)]),
        Value::array(vec![num(1), num(2)])
    );
    assert_ne!(Value::array(vec![num(1)]), Value::array(vec![num(1), num(2)]));

    let a = Value::object(Object::new("A"));
    let b = Value::object(Object::new("A"));
    assert_eq!(a, a.clone());
    assert_ne!(a, b);

    let f = Value::function(Function::native("f", &[], |_| Ok(Value::None)));
    let g = Value::function(Function::native("f", &[], |_| Ok(Value::None)));
    assert_eq!(f, f.clone());
    assert_ne!(f, g);
}

#[test]
fn arrays_are_shared_between_clones() {
    let value = Value::array(vec![num(1)]);
    let alias = value.clone();
    alias
        .as_array()
        .borrow_mut()
        .set_item(0, num(9))
        .expect("write");
    assert_eq!(value.as_array().borrow().item(0).expect("read"), num(9));
}

#[test]
#[should_panic(expected = "accessed as Number")]
fn wrong_payload_access_panics() {
    Value::string("x").as_number();
}

#[test]
fn integer_detection() {
    assert!(num(4).is_integer());
    assert!(dec("4.00").is_integer());
    assert!(!dec("4.5").is_integer());
    assert!(!Value::string("4").is_integer());
}

#[test]
fn array_growth_and_bounds() {
    let mut array = Array::new();
    array.set_item(2, num(5)).expect("grow");
    assert_eq!(array.len(), 3);
    assert_eq!(array.item(0).expect("slot"), Value::None);
    assert!(array.item(3).is_err());
    assert!(array.item(-1).is_err());
    assert!(array.set_item(-1, num(1)).is_err());

    array.set_len(1).expect("shrink");
    assert_eq!(array.as_slice(), &[Value::None]);
    array.set_len(2).expect("pad");
    assert_eq!(array.len(), 2);
    let err = array.set_len(-3).expect_err("negative length");
    assert!(err.to_string().contains("negative"));
}

#[test]
fn cyclic_containers_render_once() {
    let array = Value::array(vec![num(1)]);
    array
        .as_array()
        .borrow_mut()
        .push(array.clone());
    assert_eq!(array.to_string(), "[1, [...]]");
    assert_eq!(format!("{array:?}"), "[1, [...]]");

    let object = Value::object(Object::new("Loop"));
    object
        .as_object()
        .borrow_mut()
        .set("me", object.clone());
    assert_eq!(format!("{object:?}"), "{\"me\": {...}}");
    assert_eq!(object.to_string(), "object Loop");
}

#[test]
fn cyclic_arrays_compare_without_recursing_forever() {
    let a = Value::array(vec![num(1)]);
    a.as_array().borrow_mut().set_item(0, a.clone()).expect("write");
    let b = Value::array(vec![num(1)]);
    b.as_array().borrow_mut().set_item(0, b.clone()).expect("write");
    assert_eq!(a, b);

    let c = Value::array(vec![num(2), num(2)]);
    c.as_array().borrow_mut().set_item(0, c.clone()).expect("write");
    assert_ne!(a, c);
}

#[test]
fn array_span_and_concat() {
    let array: Array = (0..5).map(num).collect();
    assert_eq!(array.span(1, 3), Array::from(vec![num(1), num(2)]));
    assert_eq!(array.span(3, 10), Array::from(vec![num(3), num(4)]));
    assert!(array.span(3, 3).is_empty());
    assert!(array.span(4, 1).is_empty());
    let joined = array
        .span(0, 1)
        .concat(&array.span(4, 5))
        .expect("concat");
    assert_eq!(joined, Array::from(vec![num(0), num(4)]));
    assert_eq!(array.reversed().item(0).expect("first"), num(4));
}

#[test]
fn object_members() {
    let mut members = IndexMap::new();
    members.insert("x".to_string(), num(1));
    let mut object = Object::with_members("Point", members);
    assert_eq!(object.get("x").expect("x"), num(1));
    object.set("y", num(2));
    assert!(object.contains("y"));
    let names: Vec<&str> = object.members().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, ["x", "y"]);
    let err = object.get("z").expect_err("missing member");
    assert!(err.to_string().contains("undefined member `z`"));
}

#[test]
fn native_functions_check_arity() {
    let double = Function::native("Double", &["n"], |args| {
        Ok(Value::Number(args[0].as_number() * Decimal::TWO))
    });
    assert_eq!(double.arity(), 1);
    assert_eq!(double.call(&[num(4)]).expect("call"), num(8));
    let err = double.call(&[]).expect_err("arity");
    assert!(err
        .to_string()
        .contains("function `Double` expected 1 arguments but received 0"));
}

#[test]
fn script_functions_bind_parameters_locally() {
    let scope = Block::new();
    scope.borrow_mut().define("a", num(100));
    let body: Executable = Rc::new(|scope: &BlockRef| Block::get_variable(scope, "a"));
    let function = Function::script("f", vec!["a".to_string()], body, Rc::clone(&scope));
    assert_eq!(function.call(&[num(1)]).expect("call"), num(1));
    assert_eq!(Block::get_variable(&scope, "a").expect("outer"), num(100));
}
