use super::*;

#[test]
fn test_truthiness() {
    assert!(!Value::Undefined.is_truthy());
    assert!(!Value::Null.is_truthy());
    assert!(!Value::Number(0.0).is_truthy());
    assert!(!Value::Number(f64::NAN).is_truthy());
    assert!(!Value::String(String::new()).is_truthy());
    assert!(Value::Number(-1.0).is_truthy());
    assert!(Value::String("0".to_string()).is_truthy());
    assert!(Value::Boolean(true).is_truthy());
}

#[test]
fn test_type_of() {
    assert_eq!(Value::Undefined.type_of(), "undefined");
    assert_eq!(Value::Null.type_of(), "object");
    assert_eq!(Value::Number(1.0).type_of(), "number");
    assert_eq!(Value::String("a".to_string()).type_of(), "string");
}

#[test]
fn test_to_number() {
    assert!(Value::Undefined.to_number().is_nan());
    assert_eq!(Value::Null.to_number(), 0.0);
    assert_eq!(Value::Boolean(true).to_number(), 1.0);
    assert_eq!(Value::String("  42 ".to_string()).to_number(), 42.0);
    assert_eq!(Value::String(String::new()).to_number(), 0.0);
    assert!(Value::String("abc".to_string()).to_number().is_nan());
}

#[test]
fn test_number_to_string() {
    assert_eq!(number_to_string(3.0), "3");
    assert_eq!(number_to_string(-0.0), "0");
    assert_eq!(number_to_string(1.5), "1.5");
    assert_eq!(number_to_string(f64::NAN), "NaN");
    assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
}

#[test]
fn test_equality() {
    assert!(Value::Null.loose_equals(&Value::Undefined));
    assert!(!Value::Null.strict_equals(&Value::Undefined));
    assert!(Value::String("1".to_string()).loose_equals(&Value::Number(1.0)));
    assert!(!Value::Number(f64::NAN).strict_equals(&Value::Number(f64::NAN)));
    assert!(Value::Boolean(true).loose_equals(&Value::Number(1.0)));
    assert!(!Value::Undefined.loose_equals(&Value::Number(0.0)));
}

#[test]
fn test_display() {
    assert_eq!(Value::Undefined.to_string(), "undefined");
    assert_eq!(Value::String("x".to_string()).to_string(), "\"x\"");
    assert_eq!(Value::Number(2.0).to_string(), "2");
}
