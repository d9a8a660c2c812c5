//! Method and field extraction through `java.lang.reflect`
//!
//! Every reader here is best-effort. A member that cannot be read becomes a
//! placeholder and the walk continues; a failing part of a member (its
//! return type, one parameter) falls back to a default for that part only.

use jbridge_sys::ValueKind;
use log::debug;
use rustc_hash::FxHashSet;

use super::descriptor::{
    ClassDescriptor, FieldDescriptor, MethodDescriptor, ELIDED_PARAMETERS, UNKNOWN_FIELD,
    UNKNOWN_METHOD, UNKNOWN_TYPE,
};
use crate::error::Result;
use crate::jni::{call_by_name, call_object_getter, LocalFrame, NativeInterface, ObjectRef};

/// `java.lang.reflect.Modifier.STATIC`
pub const STATIC_MODIFIER: i32 = 8;

/// Parameter lists longer than this are recorded as `["..."]`
pub const MAX_PARAM_COUNT: i32 = 50;

/// Local references needed to read one member
const MEMBER_FRAME: i32 = 16;

const METHOD_ARRAY: &str = "()[Ljava/lang/reflect/Method;";
const FIELD_ARRAY: &str = "()[Ljava/lang/reflect/Field;";
const CLASS_ARRAY: &str = "()[Ljava/lang/Class;";
const GET_CLASS: &str = "()Ljava/lang/Class;";
const GET_STRING: &str = "()Ljava/lang/String;";

/// Reads descriptors off `java.lang.Class` objects.
pub struct Reflector<'a> {
    env: &'a dyn NativeInterface,
}

impl<'a> Reflector<'a> {
    /// Reflector over `env`
    pub fn new(env: &'a dyn NativeInterface) -> Self {
        Self { env }
    }

    /// Full descriptor for `class` (a `java.lang.Class` reference).
    pub fn describe(&self, class: ObjectRef, name: &str) -> ClassDescriptor {
        ClassDescriptor::new(name, self.methods(class), self.fields(class))
    }

    /// `getName()` of a class object
    pub fn class_name(&self, class: ObjectRef) -> Option<String> {
        self.string_of(class, "getName")
    }

    /// Declared methods, then inherited public ones, keyed by `name(params)`.
    pub fn methods(&self, class: ObjectRef) -> Vec<MethodDescriptor> {
        let mut seen = FxHashSet::default();
        let mut methods = Vec::new();
        for source in ["getDeclaredMethods", "getMethods"] {
            let walked = self.each_member(class, source, METHOD_ARRAY, |member| {
                let method = match member {
                    Some(m) => self.method(m),
                    None => MethodDescriptor::placeholder(),
                };
                if seen.insert(method.key()) {
                    methods.push(method);
                }
            });
            if let Err(e) = walked {
                debug!("{} failed: {}", source, e);
            }
        }
        methods
    }

    /// Declared fields, then inherited public ones, keyed by name.
    pub fn fields(&self, class: ObjectRef) -> Vec<FieldDescriptor> {
        let mut seen = FxHashSet::default();
        let mut fields = Vec::new();
        for source in ["getDeclaredFields", "getFields"] {
            let walked = self.each_member(class, source, FIELD_ARRAY, |member| {
                let field = match member {
                    Some(f) => self.field(f),
                    None => FieldDescriptor::placeholder(),
                };
                if seen.insert(field.name.clone()) {
                    fields.push(field);
                }
            });
            if let Err(e) = walked {
                debug!("{} failed: {}", source, e);
            }
        }
        fields
    }

    /// Visit each element of the array returned by `class.<source>()`.
    ///
    /// Each element is read inside its own local frame. `visit` receives
    /// `None` when an element could not be fetched at all. Null elements are
    /// skipped.
    fn each_member<F>(&self, class: ObjectRef, source: &str, sig: &str, mut visit: F) -> Result<()>
    where
        F: FnMut(Option<ObjectRef>),
    {
        let outer = LocalFrame::push(self.env, MEMBER_FRAME)?;
        let Some(array) = call_object_getter(self.env, class, source, sig)? else {
            outer.pop(ObjectRef::NULL);
            return Ok(());
        };
        let count = self.env.get_array_length(array)?;

        for i in 0..count {
            let frame = match LocalFrame::push(self.env, MEMBER_FRAME) {
                Ok(frame) => frame,
                Err(e) => {
                    debug!("cannot reserve frame for {}[{}]: {}", source, i, e);
                    visit(None);
                    continue;
                }
            };
            match self.env.get_object_array_element(array, i) {
                Ok(member) if member.is_null() => {}
                Ok(member) => visit(Some(member)),
                Err(e) => {
                    debug!("{}[{}] unreadable: {}", source, i, e);
                    visit(None);
                }
            }
            frame.pop(ObjectRef::NULL);
        }

        outer.pop(ObjectRef::NULL);
        Ok(())
    }

    fn method(&self, m: ObjectRef) -> MethodDescriptor {
        let name = self
            .string_of(m, "getName")
            .unwrap_or_else(|| UNKNOWN_METHOD.to_string());
        let return_type = self
            .type_name_of(m, "getReturnType")
            .unwrap_or_else(|| "void".to_string());
        let parameters = self.parameters(m);
        let is_static = self.is_static(m);
        MethodDescriptor::new(name, parameters, return_type, is_static)
    }

    fn field(&self, f: ObjectRef) -> FieldDescriptor {
        let name = self
            .string_of(f, "getName")
            .unwrap_or_else(|| UNKNOWN_FIELD.to_string());
        let field_type = self
            .type_name_of(f, "getType")
            .unwrap_or_else(|| UNKNOWN_TYPE.to_string());
        FieldDescriptor::new(name, field_type, self.is_static(f))
    }

    fn parameters(&self, m: ObjectRef) -> Vec<String> {
        let array = match call_object_getter(self.env, m, "getParameterTypes", CLASS_ARRAY) {
            Ok(Some(array)) => array,
            _ => return Vec::new(),
        };
        let count = match self.env.get_array_length(array) {
            Ok(count) => count,
            Err(_) => return Vec::new(),
        };
        if count > MAX_PARAM_COUNT {
            return vec![ELIDED_PARAMETERS.to_string()];
        }

        (0..count)
            .map(|i| {
                self.env
                    .get_object_array_element(array, i)
                    .ok()
                    .filter(|p| !p.is_null())
                    .and_then(|p| {
                        let name = self.class_name(p);
                        let _ = self.env.delete_local_ref(p);
                        name
                    })
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_TYPE.to_string())
            })
            .collect()
    }

    fn is_static(&self, member: ObjectRef) -> bool {
        call_by_name(self.env, member, "getModifiers", "()I", ValueKind::Int, &[])
            .ok()
            .and_then(|r| r.as_i64())
            .map_or(false, |modifiers| modifiers as i32 & STATIC_MODIFIER != 0)
    }

    /// `obj.<getter>().getName()`, ignoring blank names
    fn type_name_of(&self, obj: ObjectRef, getter: &str) -> Option<String> {
        let class = call_object_getter(self.env, obj, getter, GET_CLASS).ok()??;
        self.class_name(class).filter(|name| !name.trim().is_empty())
    }

    /// `obj.<getter>()` read as a Rust string
    fn string_of(&self, obj: ObjectRef, getter: &str) -> Option<String> {
        let s = call_object_getter(self.env, obj, getter, GET_STRING).ok()??;
        self.env.get_string_utf_chars(s).ok().flatten()
    }
}
