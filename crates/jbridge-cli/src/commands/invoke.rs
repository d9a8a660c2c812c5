//! `jbridge get` and `jbridge call`

use jbridge::{ClassProxy, JavaValue, Runtime, Value};

/// Host value for a command-line argument
pub fn parse_arg(raw: &str) -> JavaValue<'static> {
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(n) = raw.parse::<i64>() {
                Value::Int(n)
            } else if let Ok(x) = raw.parse::<f64>() {
                Value::Float(x)
            } else {
                Value::Str(raw.to_string())
            }
        }
    }
}

pub fn get(rt: &'static Runtime, class: &str, field: &str) -> anyhow::Result<()> {
    let proxy = ClassProxy::new(rt, class);
    let value = proxy.get(field)?;
    println!("{}", value);
    Ok(())
}

pub fn call(rt: &'static Runtime, class: &str, method: &str, args: &[String]) -> anyhow::Result<()> {
    let proxy = ClassProxy::new(rt, class);
    let args: Vec<JavaValue<'static>> = args.iter().map(|a| parse_arg(a)).collect();
    let result = proxy.call(method, &args)?;
    match result.as_object() {
        Some(object) => match object.call("toString", &[]) {
            Ok(text) => println!("{}", text),
            Err(_) => println!("{}", result),
        },
        None => println!("{}", result),
    }
    Ok(())
}
