//! In-memory JVM for integration tests
//!
//! `MockEnv` implements `NativeInterface` over a small object heap. Classes
//! are plain tables of methods and fields; method bodies are closures. The
//! reflection surface the bridge drives (`Class.getDeclaredMethods`,
//! `Method.getName`, `Package.getPackages`, ...) is itself modelled as
//! ordinary methods on the built-in classes, so every call goes through the
//! same ID lookup and typed dispatch a real VM would check.
//!
//! Local references belong to the frame that created them and die when it
//! pops. Touching a dead reference panics, which catches leaks of locals
//! across frames.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use jbridge::jni::{FieldId, MethodId};
use jbridge::proxy::signature::{method_signature, type_signature};
use jbridge::sys::{ValueKind, JNI_VERSION_1_8};
use jbridge::{BridgeError, JArg, JReturn, NativeInterface, ObjectRef, Result, Runtime};
use parking_lot::Mutex;

/// Method body: `(env, receiver or class, args)`
pub type Body = Arc<dyn Fn(&MockEnv, ObjectRef, &[JArg]) -> Result<JReturn> + Send + Sync>;

const REF_BASE: usize = 0x1000;
const METHOD_BASE: usize = 0x10_0000;
const FIELD_BASE: usize = 0x20_0000;

/// `Modifier.PUBLIC`
const PUBLIC: i32 = 1;
/// `Modifier.STATIC`
const STATIC: i32 = 8;

/// The exception a body raises, as the bridge would report it
pub fn thrown(operation: &'static str) -> BridgeError {
    BridgeError::NativeException { operation }
}

// ============================================================================
// Class tables
// ============================================================================

#[derive(Clone)]
pub struct MethodDef {
    pub name: String,
    pub params: Vec<String>,
    pub ret: String,
    pub is_static: bool,
    /// `Method.getName()` raises for this method
    pub unreadable: bool,
    body: Body,
}

impl MethodDef {
    fn signature(&self) -> String {
        method_signature(&self.params, &self.ret)
    }
}

#[derive(Clone, Debug)]
pub enum FieldValue {
    Prim(JReturn),
    Str(String),
    BoxedBool(bool),
    Null,
}

#[derive(Clone)]
pub struct FieldDef {
    pub name: String,
    pub ty: String,
    pub is_static: bool,
    /// `GetStaticFieldID` raises for this field
    pub broken: bool,
    value: FieldValue,
}

#[derive(Clone)]
pub struct ClassDef {
    pub name: String,
    pub superclass: Option<String>,
    methods: Vec<MethodDef>,
    fields: Vec<FieldDef>,
}

impl ClassDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            superclass: (name != "java.lang.Object").then(|| "java.lang.Object".to_string()),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn extends(mut self, superclass: &str) -> Self {
        self.superclass = Some(superclass.to_string());
        self
    }

    fn add_method<F>(mut self, name: &str, params: &[&str], ret: &str, is_static: bool, body: F) -> Self
    where
        F: Fn(&MockEnv, ObjectRef, &[JArg]) -> Result<JReturn> + Send + Sync + 'static,
    {
        self.methods.push(MethodDef {
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            ret: ret.to_string(),
            is_static,
            unreadable: false,
            body: Arc::new(body),
        });
        self
    }

    pub fn static_method<F>(self, name: &str, params: &[&str], ret: &str, body: F) -> Self
    where
        F: Fn(&MockEnv, ObjectRef, &[JArg]) -> Result<JReturn> + Send + Sync + 'static,
    {
        self.add_method(name, params, ret, true, body)
    }

    pub fn method<F>(self, name: &str, params: &[&str], ret: &str, body: F) -> Self
    where
        F: Fn(&MockEnv, ObjectRef, &[JArg]) -> Result<JReturn> + Send + Sync + 'static,
    {
        self.add_method(name, params, ret, false, body)
    }

    /// Static `void` method whose reflected name cannot be read
    pub fn unreadable_method(self, params: &[&str]) -> Self {
        let mut def = self.add_method("hidden", params, "void", true, |_, _, _| Ok(JReturn::Void));
        if let Some(m) = def.methods.last_mut() {
            m.unreadable = true;
        }
        def
    }

    pub fn static_field(mut self, name: &str, ty: &str, value: FieldValue) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            ty: ty.to_string(),
            is_static: true,
            broken: false,
            value,
        });
        self
    }

    pub fn field(mut self, name: &str, ty: &str) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            ty: ty.to_string(),
            is_static: false,
            broken: false,
            value: FieldValue::Null,
        });
        self
    }

    /// Static field that reflection lists but `GetStaticFieldID` rejects
    pub fn broken_static_field(mut self, name: &str, ty: &str) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            ty: ty.to_string(),
            is_static: true,
            broken: true,
            value: FieldValue::Null,
        });
        self
    }

    fn package(&self) -> &str {
        self.name.rsplit_once('.').map_or("", |(pkg, _)| pkg)
    }
}

// ============================================================================
// Heap
// ============================================================================

#[derive(Clone, Debug)]
pub enum Obj {
    Class(String),
    Str(String),
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Method { class: String, index: usize },
    Field { class: String, index: usize },
    Array { items: Vec<Option<usize>> },
    Package(String),
    Instance { class: String, value: i64 },
    Runtime,
}

impl Obj {
    fn class_name(&self) -> String {
        match self {
            Obj::Class(_) => "java.lang.Class",
            Obj::Str(_) => "java.lang.String",
            Obj::Boolean(_) => "java.lang.Boolean",
            Obj::Integer(_) => "java.lang.Integer",
            Obj::Long(_) => "java.lang.Long",
            Obj::Method { .. } => "java.lang.reflect.Method",
            Obj::Field { .. } => "java.lang.reflect.Field",
            Obj::Array { .. } => "[Ljava.lang.Object;",
            Obj::Package(_) => "java.lang.Package",
            Obj::Instance { class, .. } => return class.clone(),
            Obj::Runtime => "java.lang.Runtime",
        }
        .to_string()
    }
}

struct Ref {
    obj: usize,
    global: bool,
    frame: usize,
}

#[derive(Default)]
struct State {
    classes: HashMap<String, ClassDef>,
    objects: Vec<Obj>,
    class_objects: HashMap<String, usize>,
    refs: HashMap<usize, Ref>,
    next_ref: usize,
    depth: usize,
    frame_capacities: Vec<i32>,
    method_ids: Vec<(String, usize)>,
    field_ids: Vec<(String, usize)>,
    find_class_calls: usize,
    halts: usize,
    calls: Vec<String>,
    fail_global_refs: bool,
    fail_frames: bool,
    fail_object_class: bool,
    quiet_missing_classes: bool,
}

impl State {
    fn alloc_obj(&mut self, obj: Obj) -> usize {
        self.objects.push(obj);
        self.objects.len() - 1
    }

    fn class_obj(&mut self, name: &str) -> usize {
        if let Some(&id) = self.class_objects.get(name) {
            return id;
        }
        let id = self.alloc_obj(Obj::Class(name.to_string()));
        self.class_objects.insert(name.to_string(), id);
        id
    }

    fn new_ref(&mut self, obj: usize, global: bool) -> ObjectRef {
        self.next_ref += 1;
        let addr = REF_BASE + self.next_ref * 8;
        let frame = self.depth;
        self.refs.insert(addr, Ref { obj, global, frame });
        ObjectRef::from_addr(addr)
    }

    fn local(&mut self, obj: usize) -> ObjectRef {
        self.new_ref(obj, false)
    }

    fn resolve(&self, handle: ObjectRef) -> usize {
        match self.refs.get(&handle.addr()) {
            Some(r) => r.obj,
            None => panic!("use of dead or foreign reference {:?}", handle),
        }
    }

    fn get(&self, handle: ObjectRef) -> &Obj {
        &self.objects[self.resolve(handle)]
    }

    fn class_of_handle(&self, handle: ObjectRef) -> String {
        match self.get(handle) {
            Obj::Class(name) => name.clone(),
            other => panic!("expected a class reference, got {:?}", other),
        }
    }

    fn is_subclass(&self, class: &str, target: &str) -> bool {
        let mut current = Some(class.to_string());
        while let Some(name) = current {
            if name == target {
                return true;
            }
            current = self.classes.get(&name).and_then(|c| c.superclass.clone());
        }
        target == "java.lang.Object"
    }

    /// Method `name` + `sig` on `class` or its superclasses
    fn find_method(&self, class: &str, name: &str, sig: &str, is_static: bool) -> Option<(String, usize)> {
        let mut current = Some(class.to_string());
        while let Some(owner) = current {
            let def = self.classes.get(&owner)?;
            let found = def
                .methods
                .iter()
                .position(|m| m.name == name && m.is_static == is_static && m.signature() == sig);
            if let Some(index) = found {
                return Some((owner, index));
            }
            current = def.superclass.clone();
        }
        None
    }

    fn method_id(&mut self, owner: String, index: usize) -> MethodId {
        let pos = match self.method_ids.iter().position(|(c, i)| *c == owner && *i == index) {
            Some(pos) => pos,
            None => {
                self.method_ids.push((owner, index));
                self.method_ids.len() - 1
            }
        };
        MethodId::from_addr(METHOD_BASE + pos * 8)
    }

    fn method_def(&self, id: MethodId) -> &MethodDef {
        let (owner, index) = &self.method_ids[(id.addr() - METHOD_BASE) / 8];
        &self.classes[owner].methods[*index]
    }

    fn field_def(&self, id: FieldId) -> &FieldDef {
        let (owner, index) = &self.field_ids[(id.addr() - FIELD_BASE) / 8];
        &self.classes[owner].fields[*index]
    }

    fn chain(&self, class: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = Some(class.to_string());
        while let Some(name) = current {
            current = self.classes.get(&name).and_then(|c| c.superclass.clone());
            chain.push(name);
        }
        chain
    }
}

// ============================================================================
// MockEnv
// ============================================================================

/// Shared handle to the fake VM. Clones see the same heap, so a test can
/// keep one while the `Runtime` owns another.
#[derive(Clone)]
pub struct MockEnv {
    state: Arc<Mutex<State>>,
}

impl MockEnv {
    /// VM with the reflection classes, boxes, `Runtime`, `Math`, `System`
    /// and a few `com.example` classes loaded.
    pub fn new() -> Self {
        let env = Self {
            state: Arc::new(Mutex::new(State::default())),
        };
        for class in jdk_classes().into_iter().chain(example_classes()) {
            env.define(class);
        }
        env
    }

    /// Boxed runtime over a clone of this VM
    pub fn runtime(&self) -> Runtime {
        Runtime::new(Box::new(self.clone()))
    }

    pub fn define(&self, class: ClassDef) {
        self.state.lock().classes.insert(class.name.clone(), class);
    }

    pub fn remove_class(&self, name: &str) {
        self.state.lock().classes.remove(name);
    }

    // ------------------------------------------------------------------------
    // Fault injection
    // ------------------------------------------------------------------------

    pub fn fail_global_refs(&self, fail: bool) {
        self.state.lock().fail_global_refs = fail;
    }

    pub fn fail_frames(&self, fail: bool) {
        self.state.lock().fail_frames = fail;
    }

    pub fn fail_object_class(&self, fail: bool) {
        self.state.lock().fail_object_class = fail;
    }

    /// `FindClass` of an unknown name returns null without raising
    pub fn quiet_missing_classes(&self, quiet: bool) {
        self.state.lock().quiet_missing_classes = quiet;
    }

    // ------------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------------

    pub fn frame_depth(&self) -> usize {
        self.state.lock().depth
    }

    pub fn frame_capacities(&self) -> Vec<i32> {
        self.state.lock().frame_capacities.clone()
    }

    pub fn live_globals(&self) -> usize {
        self.state.lock().refs.values().filter(|r| r.global).count()
    }

    pub fn live_locals(&self) -> usize {
        self.state.lock().refs.values().filter(|r| !r.global).count()
    }

    pub fn find_class_calls(&self) -> usize {
        self.state.lock().find_class_calls
    }

    pub fn halts(&self) -> usize {
        self.state.lock().halts
    }

    /// `Class.method` of every call made so far
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn is_live(&self, handle: ObjectRef) -> bool {
        self.state.lock().refs.contains_key(&handle.addr())
    }

    /// Object behind a live reference
    pub fn object(&self, handle: ObjectRef) -> Obj {
        self.state.lock().get(handle).clone()
    }

    // ------------------------------------------------------------------------
    // Helpers for method bodies
    // ------------------------------------------------------------------------

    pub fn new_local(&self, obj: Obj) -> ObjectRef {
        let mut state = self.state.lock();
        let id = state.alloc_obj(obj);
        state.local(id)
    }

    pub fn new_instance(&self, class: &str, value: i64) -> ObjectRef {
        self.new_local(Obj::Instance {
            class: class.to_string(),
            value,
        })
    }

    pub fn string(&self, handle: ObjectRef) -> Option<String> {
        if handle.is_null() {
            return None;
        }
        match self.object(handle) {
            Obj::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn instance_value(&self, handle: ObjectRef) -> i64 {
        match self.object(handle) {
            Obj::Instance { value, .. } => value,
            other => panic!("not an instance: {:?}", other),
        }
    }

    pub fn set_instance_value(&self, handle: ObjectRef, new_value: i64) {
        let mut state = self.state.lock();
        let id = state.resolve(handle);
        if let Obj::Instance { value, .. } = &mut state.objects[id] {
            *value = new_value;
        }
    }

    fn string_result(&self, s: impl Into<String>) -> Result<JReturn> {
        Ok(JReturn::Object(self.new_local(Obj::Str(s.into()))))
    }

    fn class_result(&self, name: &str) -> JReturn {
        let mut state = self.state.lock();
        let id = state.class_obj(name);
        JReturn::Object(state.local(id))
    }

    fn array_result(&self, items: Vec<Obj>) -> Result<JReturn> {
        let mut state = self.state.lock();
        let items = items.into_iter().map(|o| Some(state.alloc_obj(o))).collect();
        let id = state.alloc_obj(Obj::Array { items });
        Ok(JReturn::Object(state.local(id)))
    }

    fn class_array_result(&self, names: &[String]) -> Result<JReturn> {
        let mut state = self.state.lock();
        let items = names.iter().map(|n| Some(state.class_obj(n))).collect();
        let id = state.alloc_obj(Obj::Array { items });
        Ok(JReturn::Object(state.local(id)))
    }

    /// Reflection objects for the members of `class`, declared only or the
    /// whole superclass chain
    fn members(&self, this: ObjectRef, inherited: bool, methods: bool) -> Result<JReturn> {
        let items = {
            let state = self.state.lock();
            let class = state.class_of_handle(this);
            let owners = if inherited {
                state.chain(&class)
            } else {
                vec![class]
            };
            let mut items = Vec::new();
            for owner in owners {
                let Some(def) = state.classes.get(&owner) else {
                    continue;
                };
                let count = if methods { def.methods.len() } else { def.fields.len() };
                for index in 0..count {
                    let class = owner.clone();
                    items.push(if methods {
                        Obj::Method { class, index }
                    } else {
                        Obj::Field { class, index }
                    });
                }
            }
            items
        };
        self.array_result(items)
    }

    fn reflected_method(&self, this: ObjectRef) -> MethodDef {
        let state = self.state.lock();
        match state.get(this) {
            Obj::Method { class, index } => state.classes[class].methods[*index].clone(),
            other => panic!("not a Method: {:?}", other),
        }
    }

    fn reflected_field(&self, this: ObjectRef) -> FieldDef {
        let state = self.state.lock();
        match state.get(this) {
            Obj::Field { class, index } => state.classes[class].fields[*index].clone(),
            other => panic!("not a Field: {:?}", other),
        }
    }

    fn check_receiver(&self, handle: ObjectRef, what: &'static str) -> Result<()> {
        if handle.is_null() {
            return Err(BridgeError::NullArgument(what));
        }
        Ok(())
    }

    fn dispatch(&self, target: ObjectRef, id: MethodId, ret: ValueKind, args: &[JArg], is_static: bool) -> Result<JReturn> {
        let (def, label) = {
            let mut state = self.state.lock();
            let def = state.method_def(id).clone();
            let (owner, _) = state.method_ids[(id.addr() - METHOD_BASE) / 8].clone();
            let label = format!("{}.{}", owner, def.name);
            state.calls.push(label.clone());
            (def, label)
        };
        assert_eq!(def.is_static, is_static, "{} called with the wrong static-ness", label);
        assert_eq!(ret, ValueKind::from_type_name(&def.ret), "{} called with the wrong return kind", label);
        assert_eq!(args.len(), def.params.len(), "{} called with the wrong arity", label);
        for (param, arg) in def.params.iter().zip(args) {
            assert!(arg_matches(param, arg), "{}: {:?} passed for {}", label, arg, param);
        }
        let result = (def.body)(self, target, args)?;
        assert_eq!(result.kind(), ret, "{} returned the wrong kind", label);
        Ok(result)
    }
}

impl Default for MockEnv {
    fn default() -> Self {
        Self::new()
    }
}

fn arg_matches(param: &str, arg: &JArg) -> bool {
    matches!(
        (ValueKind::from_type_name(param), arg),
        (ValueKind::Boolean, JArg::Bool(_))
            | (ValueKind::Byte, JArg::Byte(_))
            | (ValueKind::Char, JArg::Char(_))
            | (ValueKind::Short, JArg::Short(_))
            | (ValueKind::Int, JArg::Int(_))
            | (ValueKind::Long, JArg::Long(_))
            | (ValueKind::Float, JArg::Float(_))
            | (ValueKind::Double, JArg::Double(_))
            | (ValueKind::Object, JArg::Object(_))
    )
}

impl NativeInterface for MockEnv {
    fn version(&self) -> Result<i32> {
        Ok(JNI_VERSION_1_8)
    }

    fn find_class(&self, name: &str) -> Result<ObjectRef> {
        let mut state = self.state.lock();
        state.find_class_calls += 1;
        let dotted = name.replace('/', ".");
        if !state.classes.contains_key(&dotted) {
            if state.quiet_missing_classes {
                return Ok(ObjectRef::NULL);
            }
            return Err(thrown("FindClass"));
        }
        let id = state.class_obj(&dotted);
        Ok(state.local(id))
    }

    fn get_object_class(&self, obj: ObjectRef) -> Result<ObjectRef> {
        self.check_receiver(obj, "object")?;
        let mut state = self.state.lock();
        if state.fail_object_class {
            return Err(thrown("GetObjectClass"));
        }
        let name = state.get(obj).class_name();
        let id = state.class_obj(&name);
        Ok(state.local(id))
    }

    fn is_instance_of(&self, obj: ObjectRef, class: ObjectRef) -> Result<bool> {
        if obj.is_null() {
            return Ok(true);
        }
        let state = self.state.lock();
        let actual = state.get(obj).class_name();
        let target = state.class_of_handle(class);
        Ok(state.is_subclass(&actual, &target))
    }

    fn get_method_id(&self, class: ObjectRef, name: &str, sig: &str) -> Result<MethodId> {
        self.check_receiver(class, "class")?;
        let mut state = self.state.lock();
        let class = state.class_of_handle(class);
        match state.find_method(&class, name, sig, false) {
            Some((owner, index)) => Ok(state.method_id(owner, index)),
            None => Err(thrown("GetMethodID")),
        }
    }

    fn get_static_method_id(&self, class: ObjectRef, name: &str, sig: &str) -> Result<MethodId> {
        self.check_receiver(class, "class")?;
        let mut state = self.state.lock();
        let class = state.class_of_handle(class);
        match state.find_method(&class, name, sig, true) {
            Some((owner, index)) => Ok(state.method_id(owner, index)),
            None => Err(thrown("GetStaticMethodID")),
        }
    }

    fn get_static_field_id(&self, class: ObjectRef, name: &str, sig: &str) -> Result<FieldId> {
        self.check_receiver(class, "class")?;
        let mut state = self.state.lock();
        let class = state.class_of_handle(class);
        let found = state.chain(&class).into_iter().find_map(|owner| {
            let def = state.classes.get(&owner)?;
            def.fields
                .iter()
                .position(|f| f.is_static && !f.broken && f.name == name && type_signature(&f.ty) == sig)
                .map(|index| (owner, index))
        });
        let Some(found) = found else {
            return Err(thrown("GetStaticFieldID"));
        };
        let pos = match state.field_ids.iter().position(|f| *f == found) {
            Some(pos) => pos,
            None => {
                state.field_ids.push(found);
                state.field_ids.len() - 1
            }
        };
        Ok(FieldId::from_addr(FIELD_BASE + pos * 8))
    }

    fn call_method(&self, obj: ObjectRef, method: MethodId, ret: ValueKind, args: &[JArg]) -> Result<JReturn> {
        self.check_receiver(obj, "object")?;
        if method.is_null() {
            return Err(BridgeError::NullArgument("method ID"));
        }
        self.dispatch(obj, method, ret, args, false)
    }

    fn call_static_method(&self, class: ObjectRef, method: MethodId, ret: ValueKind, args: &[JArg]) -> Result<JReturn> {
        self.check_receiver(class, "class")?;
        if method.is_null() {
            return Err(BridgeError::NullArgument("method ID"));
        }
        self.dispatch(class, method, ret, args, true)
    }

    fn get_static_field(&self, class: ObjectRef, field: FieldId, kind: ValueKind) -> Result<JReturn> {
        self.check_receiver(class, "class")?;
        let def = self.state.lock().field_def(field).clone();
        assert_eq!(kind, ValueKind::from_type_name(&def.ty), "field {} read as {:?}", def.name, kind);
        Ok(match def.value {
            FieldValue::Prim(value) => value,
            FieldValue::Str(s) => JReturn::Object(self.new_local(Obj::Str(s))),
            FieldValue::BoxedBool(b) => JReturn::Object(self.new_local(Obj::Boolean(b))),
            FieldValue::Null => JReturn::Object(ObjectRef::NULL),
        })
    }

    fn new_string_utf(&self, s: &str) -> Result<ObjectRef> {
        Ok(self.new_local(Obj::Str(s.to_string())))
    }

    fn get_string_utf_chars(&self, s: ObjectRef) -> Result<Option<String>> {
        self.check_receiver(s, "string")?;
        match self.object(s) {
            Obj::Str(text) => Ok(Some(text)),
            _ => Err(thrown("GetStringUTFChars")),
        }
    }

    fn get_array_length(&self, array: ObjectRef) -> Result<i32> {
        self.check_receiver(array, "array")?;
        match self.object(array) {
            Obj::Array { items } => Ok(items.len() as i32),
            _ => Err(thrown("GetArrayLength")),
        }
    }

    fn get_object_array_element(&self, array: ObjectRef, index: i32) -> Result<ObjectRef> {
        self.check_receiver(array, "array")?;
        let mut state = self.state.lock();
        let item = match state.get(array) {
            Obj::Array { items } => items.get(index as usize).copied(),
            _ => None,
        };
        match item {
            Some(Some(id)) => Ok(state.local(id)),
            Some(None) => Ok(ObjectRef::NULL),
            None => Err(thrown("GetObjectArrayElement")),
        }
    }

    fn new_global_ref(&self, obj: ObjectRef) -> Result<ObjectRef> {
        let mut state = self.state.lock();
        if obj.is_null() || state.fail_global_refs {
            return Ok(ObjectRef::NULL);
        }
        let id = state.resolve(obj);
        Ok(state.new_ref(id, true))
    }

    fn delete_global_ref(&self, obj: ObjectRef) -> Result<()> {
        let mut state = self.state.lock();
        match state.refs.remove(&obj.addr()) {
            Some(r) => assert!(r.global, "DeleteGlobalRef on a local reference"),
            None => panic!("DeleteGlobalRef on dead reference {:?}", obj),
        }
        Ok(())
    }

    fn delete_local_ref(&self, obj: ObjectRef) -> Result<()> {
        if obj.is_null() {
            return Ok(());
        }
        let mut state = self.state.lock();
        if let Some(r) = state.refs.get(&obj.addr()) {
            assert!(!r.global, "DeleteLocalRef on a global reference");
            state.refs.remove(&obj.addr());
        }
        Ok(())
    }

    fn push_local_frame(&self, capacity: i32) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_frames {
            return Err(BridgeError::LocalFrame { capacity });
        }
        state.depth += 1;
        state.frame_capacities.push(capacity);
        Ok(())
    }

    fn pop_local_frame(&self, result: ObjectRef) -> ObjectRef {
        let mut state = self.state.lock();
        assert!(state.depth > 0, "PopLocalFrame without a frame");
        let survivor = (!result.is_null()).then(|| state.resolve(result));
        let depth = state.depth;
        state.refs.retain(|_, r| r.global || r.frame < depth);
        state.depth -= 1;
        match survivor {
            Some(id) => state.local(id),
            None => ObjectRef::NULL,
        }
    }
}

// ============================================================================
// Built-in classes
// ============================================================================

fn object_arg(args: &[JArg], index: usize) -> ObjectRef {
    match args.get(index) {
        Some(JArg::Object(r)) => *r,
        other => panic!("expected object argument, got {:?}", other),
    }
}

fn int_arg(args: &[JArg], index: usize) -> i32 {
    match args.get(index) {
        Some(JArg::Int(n)) => *n,
        other => panic!("expected int argument, got {:?}", other),
    }
}

fn long_arg(args: &[JArg], index: usize) -> i64 {
    match args.get(index) {
        Some(JArg::Long(n)) => *n,
        other => panic!("expected long argument, got {:?}", other),
    }
}

fn double_arg(args: &[JArg], index: usize) -> f64 {
    match args.get(index) {
        Some(JArg::Double(x)) => *x,
        other => panic!("expected double argument, got {:?}", other),
    }
}

fn jdk_classes() -> Vec<ClassDef> {
    let object = ClassDef::new("java.lang.Object")
        .method("toString", &[], "java.lang.String", |env, this, _| {
            let text = match env.object(this) {
                Obj::Str(s) => s,
                Obj::Boolean(b) => b.to_string(),
                Obj::Integer(n) => n.to_string(),
                Obj::Long(n) => n.to_string(),
                other => format!("{}@{:x}", other.class_name(), this.addr()),
            };
            env.string_result(text)
        })
        .method("hashCode", &[], "int", |_, this, _| Ok(JReturn::Int(this.addr() as i32)));

    let class = ClassDef::new("java.lang.Class")
        .method("getName", &[], "java.lang.String", |env, this, _| {
            let name = env.state.lock().class_of_handle(this);
            env.string_result(name)
        })
        .method("getDeclaredMethods", &[], "[Ljava.lang.reflect.Method;", |env, this, _| {
            env.members(this, false, true)
        })
        .method("getMethods", &[], "[Ljava.lang.reflect.Method;", |env, this, _| {
            env.members(this, true, true)
        })
        .method("getDeclaredFields", &[], "[Ljava.lang.reflect.Field;", |env, this, _| {
            env.members(this, false, false)
        })
        .method("getFields", &[], "[Ljava.lang.reflect.Field;", |env, this, _| {
            env.members(this, true, false)
        })
        .static_method("forName", &["java.lang.String"], "java.lang.Class", |env, _, args| {
            let name = env.string(object_arg(args, 0)).unwrap_or_default();
            if !env.state.lock().classes.contains_key(&name) {
                return Err(thrown("CallStaticObjectMethodA"));
            }
            Ok(env.class_result(&name))
        });

    let method = ClassDef::new("java.lang.reflect.Method")
        .method("getName", &[], "java.lang.String", |env, this, _| {
            let def = env.reflected_method(this);
            if def.unreadable {
                return Err(thrown("CallObjectMethodA"));
            }
            env.string_result(def.name)
        })
        .method("getReturnType", &[], "java.lang.Class", |env, this, _| {
            Ok(env.class_result(&env.reflected_method(this).ret))
        })
        .method("getParameterTypes", &[], "[Ljava.lang.Class;", |env, this, _| {
            env.class_array_result(&env.reflected_method(this).params)
        })
        .method("getModifiers", &[], "int", |env, this, _| {
            let is_static = env.reflected_method(this).is_static;
            Ok(JReturn::Int(PUBLIC | if is_static { STATIC } else { 0 }))
        });

    let field = ClassDef::new("java.lang.reflect.Field")
        .method("getName", &[], "java.lang.String", |env, this, _| {
            env.string_result(env.reflected_field(this).name)
        })
        .method("getType", &[], "java.lang.Class", |env, this, _| {
            Ok(env.class_result(&env.reflected_field(this).ty))
        })
        .method("getModifiers", &[], "int", |env, this, _| {
            let is_static = env.reflected_field(this).is_static;
            Ok(JReturn::Int(PUBLIC | if is_static { STATIC } else { 0 }))
        });

    let package = ClassDef::new("java.lang.Package")
        .method("getName", &[], "java.lang.String", |env, this, _| match env.object(this) {
            Obj::Package(name) => env.string_result(name),
            other => panic!("not a Package: {:?}", other),
        })
        .static_method("getPackages", &[], "[Ljava.lang.Package;", |env, _, _| {
            let names: BTreeSet<String> = env
                .state
                .lock()
                .classes
                .values()
                .map(|c| c.package().to_string())
                .collect();
            env.array_result(names.into_iter().map(Obj::Package).collect())
        });

    let string = ClassDef::new("java.lang.String")
        .method("length", &[], "int", |env, this, _| {
            let s = env.string(this).unwrap_or_default();
            Ok(JReturn::Int(s.encode_utf16().count() as i32))
        })
        .method("toUpperCase", &[], "java.lang.String", |env, this, _| {
            env.string_result(env.string(this).unwrap_or_default().to_uppercase())
        })
        .static_method("valueOf", &["boolean"], "java.lang.String", |env, _, args| match args[0] {
            JArg::Bool(b) => env.string_result(b.to_string()),
            _ => unreachable!(),
        })
        .static_method("valueOf", &["char"], "java.lang.String", |env, _, args| match args[0] {
            JArg::Char(c) => env.string_result(String::from_utf16_lossy(&[c])),
            _ => unreachable!(),
        })
        .static_method("valueOf", &["int"], "java.lang.String", |env, _, args| {
            env.string_result(int_arg(args, 0).to_string())
        })
        .static_method("valueOf", &["double"], "java.lang.String", |env, _, args| {
            env.string_result(format!("{:?}", double_arg(args, 0)))
        });

    let boolean = ClassDef::new("java.lang.Boolean")
        .method("booleanValue", &[], "boolean", |env, this, _| match env.object(this) {
            Obj::Boolean(b) => Ok(JReturn::Boolean(b)),
            other => panic!("not a Boolean: {:?}", other),
        })
        .static_method("valueOf", &["boolean"], "java.lang.Boolean", |env, _, args| match args[0] {
            JArg::Bool(b) => Ok(JReturn::Object(env.new_local(Obj::Boolean(b)))),
            _ => unreachable!(),
        })
        .static_field("TRUE", "java.lang.Boolean", FieldValue::BoxedBool(true))
        .static_field("FALSE", "java.lang.Boolean", FieldValue::BoxedBool(false));

    let number = ClassDef::new("java.lang.Number");

    let integer = ClassDef::new("java.lang.Integer")
        .extends("java.lang.Number")
        .method("intValue", &[], "int", |env, this, _| match env.object(this) {
            Obj::Integer(n) => Ok(JReturn::Int(n)),
            other => panic!("not an Integer: {:?}", other),
        })
        .static_method("valueOf", &["int"], "java.lang.Integer", |env, _, args| {
            Ok(JReturn::Object(env.new_local(Obj::Integer(int_arg(args, 0)))))
        })
        .static_method("parseInt", &["java.lang.String"], "int", |env, _, args| {
            let text = env.string(object_arg(args, 0)).unwrap_or_default();
            text.parse::<i32>()
                .map(JReturn::Int)
                .map_err(|_| thrown("CallStaticIntMethodA"))
        })
        .static_field("MAX_VALUE", "int", FieldValue::Prim(JReturn::Int(i32::MAX)));

    let long = ClassDef::new("java.lang.Long")
        .extends("java.lang.Number")
        .method("longValue", &[], "long", |env, this, _| match env.object(this) {
            Obj::Long(n) => Ok(JReturn::Long(n)),
            other => panic!("not a Long: {:?}", other),
        })
        .static_method("valueOf", &["long"], "java.lang.Long", |env, _, args| {
            Ok(JReturn::Object(env.new_local(Obj::Long(long_arg(args, 0)))))
        });

    let runtime = ClassDef::new("java.lang.Runtime")
        .static_method("getRuntime", &[], "java.lang.Runtime", |env, _, _| {
            Ok(JReturn::Object(env.new_local(Obj::Runtime)))
        })
        .method("halt", &["int"], "void", |env, _, _| {
            env.state.lock().halts += 1;
            Ok(JReturn::Void)
        });

    let math = ClassDef::new("java.lang.Math")
        .static_method("max", &["int", "int"], "int", |_, _, args| {
            Ok(JReturn::Int(int_arg(args, 0).max(int_arg(args, 1))))
        })
        .static_method("max", &["long", "long"], "long", |_, _, args| {
            Ok(JReturn::Long(long_arg(args, 0).max(long_arg(args, 1))))
        })
        .static_method("max", &["double", "double"], "double", |_, _, args| {
            Ok(JReturn::Double(double_arg(args, 0).max(double_arg(args, 1))))
        })
        // Listed widest-first so callers cannot rely on reflection order.
        .static_method("abs", &["double"], "double", |_, _, args| {
            Ok(JReturn::Double(double_arg(args, 0).abs()))
        })
        .static_method("abs", &["int"], "int", |_, _, args| Ok(JReturn::Int(int_arg(args, 0).abs())))
        .static_method("abs", &["long"], "long", |_, _, args| {
            Ok(JReturn::Long(long_arg(args, 0).abs()))
        })
        .static_field("PI", "double", FieldValue::Prim(JReturn::Double(std::f64::consts::PI)));

    let system = ClassDef::new("java.lang.System")
        .static_method("currentTimeMillis", &[], "long", |_, _, _| Ok(JReturn::Long(1_700_000_000_000)))
        .static_method("getProperty", &["java.lang.String"], "java.lang.String", |env, _, args| {
            match env.string(object_arg(args, 0)).as_deref() {
                Some("java.version") => env.string_result("1.8.0_392"),
                _ => Ok(JReturn::Object(ObjectRef::NULL)),
            }
        });

    let array_list = ClassDef::new("java.util.ArrayList");

    vec![
        object, class, method, field, package, string, boolean, number, integer, long, runtime, math,
        system, array_list,
    ]
}

fn example_classes() -> Vec<ClassDef> {
    let counter = ClassDef::new("com.example.Counter")
        .static_method("create", &["int"], "com.example.Counter", |env, _, args| {
            Ok(JReturn::Object(env.new_instance("com.example.Counter", int_arg(args, 0) as i64)))
        })
        .method("get", &[], "int", |env, this, _| Ok(JReturn::Int(env.instance_value(this) as i32)))
        .method("add", &["int"], "void", |env, this, args| {
            let value = env.instance_value(this) + int_arg(args, 0) as i64;
            env.set_instance_value(this, value);
            Ok(JReturn::Void)
        })
        .method("isZero", &[], "boolean", |env, this, _| Ok(JReturn::Boolean(env.instance_value(this) == 0)))
        .method("label", &["java.lang.String"], "java.lang.String", |env, this, args| {
            let prefix = env.string(object_arg(args, 0)).unwrap_or_default();
            env.string_result(format!("{}{}", prefix, env.instance_value(this)))
        })
        .method("toString", &[], "java.lang.String", |env, this, _| {
            env.string_result(format!("Counter({})", env.instance_value(this)))
        })
        .field("count", "int");

    let echo = ClassDef::new("com.example.Echo")
        .static_method("echo", &["java.lang.Object"], "java.lang.Object", |_, _, args| {
            Ok(JReturn::Object(object_arg(args, 0)))
        })
        .static_method("sum6", &["int", "int", "int", "int", "int", "int"], "int", |_, _, args| {
            Ok(JReturn::Int((0..6).map(|i| int_arg(args, i)).sum()))
        })
        .static_method("nothing", &[], "java.lang.Object", |_, _, _| Ok(JReturn::Object(ObjectRef::NULL)))
        .static_method("fail", &[], "void", |_, _, _| Err(thrown("CallStaticVoidMethodA")))
        .static_field("GREETING", "java.lang.String", FieldValue::Str("héllo".to_string()))
        .static_field("ANSWER", "long", FieldValue::Prim(JReturn::Long(42)))
        .static_field("RATIO", "float", FieldValue::Prim(JReturn::Float(0.5)))
        .static_field("ENABLED", "boolean", FieldValue::Prim(JReturn::Boolean(true)))
        .static_field("INITIAL", "char", FieldValue::Prim(JReturn::Char('J' as u16)))
        .static_field("NOTHING", "java.lang.Object", FieldValue::Null)
        .broken_static_field("BROKEN", "int");

    let wide: Vec<&str> = vec!["int"; 51];
    let odd = ClassDef::new("com.example.Odd")
        .unreadable_method(&["int"])
        .static_method("wide", &wide, "void", |_, _, _| Ok(JReturn::Void))
        .static_method("count", &[], "int", |_, _, _| Ok(JReturn::Int(3)));

    let helper = ClassDef::new("com.example.Helper");

    vec![counter, echo, odd, helper]
}
