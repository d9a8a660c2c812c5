//! JNI type descriptors from reflected type names

/// Descriptor for one reflected type name.
///
/// Primitives map to their single letter, reflection array names
/// (`[I`, `[Ljava.lang.String;`) only need their dots swapped, and anything
/// else is a class name wrapped as `L...;`.
pub fn type_signature(type_name: &str) -> String {
    let letter = match type_name {
        "int" => "I",
        "long" => "J",
        "float" => "F",
        "double" => "D",
        "boolean" => "Z",
        "void" => "V",
        "byte" => "B",
        "char" => "C",
        "short" => "S",
        _ if type_name.starts_with('[') => return type_name.replace('.', "/"),
        _ => return format!("L{};", type_name.replace('.', "/")),
    };
    letter.to_string()
}

/// Method descriptor: `(` params `)` return.
pub fn method_signature<S: AsRef<str>>(parameters: &[S], return_type: &str) -> String {
    let mut sig = String::from("(");
    for param in parameters {
        sig.push_str(&type_signature(param.as_ref()));
    }
    sig.push(')');
    sig.push_str(&type_signature(return_type));
    sig
}
