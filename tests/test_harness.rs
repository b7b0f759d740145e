// tests/test_harness.rs
//! Test harness for end to end tests.
//!
//! Compiles Atypical sources with [`Unit`] and executes the resulting class
//! records on a small stack machine. The machine models just enough of the
//! runtime library (strings, `System.out`, `Math`, and the reflection calls
//! made by trait casts) to observe program behavior.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use atypical::{AccessFlags, AtypicalError, ClassRecord, CompiledProgram, CompilerOptions, Unit};
use atypical_compiler::bytecode::{Constant, Instruction, Label, MemberRef, MethodRef, Opcode};
use atypical_core::MethodDescriptor;
use rustc_hash::FxHashMap;

/// Load a test script from the test_scripts directory.
pub fn load_script(filename: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_scripts")
        .join(filename);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

/// Compile one script from test_scripts, panicking with the rendered error.
pub fn compile_script(filename: &str) -> CompiledProgram {
    let source = load_script(filename);
    compile_sources(&[(filename, source.as_str())], CompilerOptions::default())
        .unwrap_or_else(|e| panic!("Failed to compile {filename}: {e}"))
}

/// Compile `source` as `main.atp` with default options.
pub fn compile_source(source: &str) -> CompiledProgram {
    compile_sources(&[("main.atp", source)], CompilerOptions::default())
        .unwrap_or_else(|e| panic!("Failed to compile: {e}"))
}

pub fn compile_sources(
    sources: &[(&str, &str)],
    options: CompilerOptions,
) -> std::result::Result<CompiledProgram, AtypicalError> {
    let mut unit = Unit::with_options(options);
    for (name, text) in sources {
        unit.add_source(*name, *text);
    }
    unit.compile()
}

// =============================================================================
// Values and heap
// =============================================================================

/// A value on the operand stack or in a local slot.
///
/// Longs and doubles occupy two stack slots; the second is a [`Value::Top`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Null,
    Ref(usize),
    Top,
}

impl Value {
    pub fn is_wide(&self) -> bool {
        matches!(self, Value::Long(_) | Value::Double(_))
    }

    pub fn as_int(&self) -> i32 {
        match self {
            Value::Int(v) => *v,
            other => panic!("expected int, found {other:?}"),
        }
    }

    pub fn as_long(&self) -> i64 {
        match self {
            Value::Long(v) => *v,
            other => panic!("expected long, found {other:?}"),
        }
    }

    pub fn as_double(&self) -> f64 {
        match self {
            Value::Double(v) => *v,
            other => panic!("expected double, found {other:?}"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Object {
    Instance {
        class: String,
        fields: FxHashMap<String, Value>,
    },
    Array(Vec<Value>),
    Str(String),
    /// `java/lang/Class` for an internal class name.
    Class(String),
    /// `java/lang/reflect/Constructor` of an internal class name.
    Constructor(String),
    PrintStream {
        err: bool,
    },
}

type Result<T> = std::result::Result<T, String>;

const STEP_LIMIT: usize = 10_000_000;

/// Executes compiled class records.
pub struct Machine {
    classes: FxHashMap<String, ClassRecord>,
    heap: Vec<Object>,
    statics: FxHashMap<(String, String), Value>,
    out: String,
    err: String,
    steps: usize,
}

impl Machine {
    pub fn new(program: CompiledProgram) -> Self {
        let classes = program
            .classes
            .into_iter()
            .map(|class| (class.name.clone(), class))
            .collect();
        Self {
            classes,
            heap: Vec::new(),
            statics: FxHashMap::default(),
            out: String::new(),
            err: String::new(),
            steps: 0,
        }
    }

    /// Everything printed to `System.out`.
    pub fn output(&self) -> &str {
        &self.out
    }

    pub fn error_output(&self) -> &str {
        &self.err
    }

    /// Call the first static method named `method` on `class`.
    pub fn run(&mut self, class: &str, method: &str, args: Vec<Value>) -> Result<Option<Value>> {
        let descriptor = self
            .classes
            .get(class)
            .and_then(|c| c.method_named(method))
            .map(|m| m.descriptor.clone())
            .ok_or_else(|| format!("NoSuchMethodError: {class}.{method}"))?;
        self.call(class, method, &descriptor, None, args)
    }

    /// Call `method` on the instance `this`.
    pub fn run_instance(&mut self, this: Value, method: &str, args: Vec<Value>) -> Result<Option<Value>> {
        let class = self.class_of(&this).ok_or("NullPointerException")?.to_string();
        let descriptor = self
            .classes
            .get(&class)
            .and_then(|c| c.method_named(method))
            .map(|m| m.descriptor.clone())
            .ok_or_else(|| format!("NoSuchMethodError: {class}.{method}"))?;
        self.call(&class, method, &descriptor, Some(this), args)
    }

    /// Allocate an instance of `class` and run the constructor taking `args`
    /// followed by the marker parameter.
    pub fn construct(&mut self, class: &str, mut args: Vec<Value>) -> Result<Value> {
        let descriptor = self
            .classes
            .get(class)
            .and_then(|c| {
                c.methods.iter().find(|m| {
                    m.name == "<init>"
                        && MethodDescriptor::parse(&m.descriptor)
                            .is_ok_and(|d| d.params.len() == args.len() + 1)
                })
            })
            .map(|m| m.descriptor.clone())
            .ok_or_else(|| format!("NoSuchMethodError: {class}.<init>"))?;
        args.push(Value::Null);
        let this = self.new_instance(class);
        self.call(class, "<init>", &descriptor, Some(this.clone()), args)?;
        Ok(this)
    }

    /// Instantiate a trait adapter around `wrapped`.
    pub fn construct_adapter(&mut self, adapter: &str, wrapped: Value) -> Result<Value> {
        let descriptor = self
            .classes
            .get(adapter)
            .and_then(|c| c.method_named("<init>"))
            .map(|m| m.descriptor.clone())
            .ok_or_else(|| format!("NoSuchMethodError: {adapter}.<init>"))?;
        let this = self.new_instance(adapter);
        self.call(adapter, "<init>", &descriptor, Some(this.clone()), vec![wrapped])?;
        Ok(this)
    }

    pub fn new_string(&mut self, s: &str) -> Value {
        self.alloc(Object::Str(s.to_string()))
    }

    pub fn string(&self, value: &Value) -> Option<&str> {
        match self.object(value)? {
            Object::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn array(&self, value: &Value) -> Option<&[Value]> {
        match self.object(value)? {
            Object::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn field(&self, value: &Value, name: &str) -> Option<&Value> {
        match self.object(value)? {
            Object::Instance { fields, .. } => fields.get(name),
            _ => None,
        }
    }

    /// Runtime class of an instance.
    pub fn class_of(&self, value: &Value) -> Option<&str> {
        match self.object(value)? {
            Object::Instance { class, .. } => Some(class),
            _ => None,
        }
    }

    fn object(&self, value: &Value) -> Option<&Object> {
        match value {
            Value::Ref(id) => self.heap.get(*id),
            _ => None,
        }
    }

    fn alloc(&mut self, object: Object) -> Value {
        self.heap.push(object);
        Value::Ref(self.heap.len() - 1)
    }

    fn new_instance(&mut self, class: &str) -> Value {
        let mut fields = FxHashMap::default();
        let mut current = Some(class.to_string());
        while let Some(name) = current.take() {
            let Some(record) = self.classes.get(&name) else {
                break;
            };
            for field in &record.fields {
                if !field.access.contains(AccessFlags::STATIC) {
                    fields.insert(field.name.clone(), default_value(&field.descriptor));
                }
            }
            current = record.superclass.clone();
        }
        self.alloc(Object::Instance {
            class: class.to_string(),
            fields,
        })
    }

    fn is_subtype(&self, class: &str, target: &str) -> bool {
        let mut current = Some(class.to_string());
        while let Some(name) = current.take() {
            if name == target {
                return true;
            }
            let Some(record) = self.classes.get(&name) else {
                return false;
            };
            if record.interfaces.iter().any(|i| i == target) {
                return true;
            }
            current = record.superclass.clone();
        }
        false
    }

    /// Whether `value` may be treated as `target`. Classes outside the
    /// program are not modeled and always match.
    fn is_instance(&self, value: &Value, target: &str) -> bool {
        if !self.classes.contains_key(target) {
            return true;
        }
        match self.object(value) {
            Some(Object::Instance { class, .. }) => self.is_subtype(class, target),
            _ => false,
        }
    }

    // =========================================================================
    // Execution
    // =========================================================================

    fn call(
        &mut self,
        owner: &str,
        name: &str,
        descriptor: &str,
        this: Option<Value>,
        args: Vec<Value>,
    ) -> Result<Option<Value>> {
        let code = self
            .classes
            .get(owner)
            .and_then(|c| c.method(name, descriptor))
            .ok_or_else(|| format!("NoSuchMethodError: {owner}.{name}{descriptor}"))?
            .code
            .clone()
            .ok_or_else(|| format!("AbstractMethodError: {owner}.{name}{descriptor}"))?;

        let mut locals = Vec::new();
        if let Some(this) = this {
            locals.push(this);
        }
        for arg in args {
            let wide = arg.is_wide();
            locals.push(arg);
            if wide {
                locals.push(Value::Top);
            }
        }
        if locals.len() < usize::from(code.max_locals) {
            locals.resize(usize::from(code.max_locals), Value::Top);
        }

        let labels: FxHashMap<Label, usize> = code
            .instructions
            .iter()
            .enumerate()
            .filter_map(|(i, insn)| match insn {
                Instruction::Label(label) => Some((*label, i)),
                _ => None,
            })
            .collect();

        let mut stack = Stack::default();
        let mut pc = 0;
        loop {
            let insn = code
                .instructions
                .get(pc)
                .ok_or_else(|| format!("VerifyError: {owner}.{name} fell off the end of its code"))?;
            pc += 1;
            self.steps += 1;
            if self.steps > STEP_LIMIT {
                return Err("step limit exceeded".to_string());
            }

            match insn {
                Instruction::Label(_) | Instruction::Line(_) => {}
                Instruction::Simple(op) => {
                    if let Some(ret) = self.simple(*op, &mut stack)? {
                        return Ok(ret);
                    }
                }
                Instruction::Int(Opcode::Newarray, atype) => {
                    let len = stack.pop_len()?;
                    let array = self.alloc(Object::Array(vec![atype_default(*atype); len]));
                    stack.push(array);
                }
                Instruction::Int(_, v) => stack.push(Value::Int(*v)),
                Instruction::Local(op, slot) => {
                    let slot = usize::from(*slot);
                    match op {
                        Opcode::Iload | Opcode::Lload | Opcode::Fload | Opcode::Dload | Opcode::Aload => {
                            stack.push(locals[slot].clone());
                        }
                        _ => locals[slot] = stack.pop()?,
                    }
                }
                Instruction::Ldc(constant) => {
                    let value = match constant {
                        Constant::Int(v) => Value::Int(*v),
                        Constant::Long(v) => Value::Long(*v),
                        Constant::Float(v) => Value::Float(v.0),
                        Constant::Double(v) => Value::Double(v.0),
                        Constant::String(s) => self.new_string(s),
                    };
                    stack.push(value);
                }
                Instruction::Type(op, class) => self.type_op(*op, class, &mut stack)?,
                Instruction::Field(op, member) => self.field_op(*op, member, &mut stack)?,
                Instruction::Invoke(op, method) => {
                    let descriptor = MethodDescriptor::parse(&method.descriptor).map_err(|e| e.to_string())?;
                    let mut args = Vec::with_capacity(descriptor.params.len());
                    for _ in &descriptor.params {
                        args.push(stack.pop()?);
                    }
                    args.reverse();
                    let receiver = if *op == Opcode::Invokestatic {
                        None
                    } else {
                        Some(stack.pop()?)
                    };
                    if let Some(result) = self.invoke(*op, method, receiver, args)? {
                        stack.push(result);
                    }
                }
                Instruction::Jump(op, label) => {
                    if self.branch_taken(*op, &mut stack)? {
                        pc = *labels
                            .get(label)
                            .ok_or_else(|| format!("VerifyError: unbound label {label}"))?;
                    }
                }
            }
        }
    }

    /// Operand-free instructions. Returns `Some` when the method returns.
    fn simple(&mut self, op: Opcode, stack: &mut Stack) -> Result<Option<Option<Value>>> {
        use Opcode::*;

        match op {
            Nop => {}
            AconstNull => stack.push(Value::Null),
            IconstM1 => stack.push(Value::Int(-1)),
            Iconst0 => stack.push(Value::Int(0)),
            Iconst1 => stack.push(Value::Int(1)),
            Iconst2 => stack.push(Value::Int(2)),
            Iconst3 => stack.push(Value::Int(3)),
            Iconst4 => stack.push(Value::Int(4)),
            Iconst5 => stack.push(Value::Int(5)),
            Lconst0 => stack.push(Value::Long(0)),
            Lconst1 => stack.push(Value::Long(1)),
            Fconst0 => stack.push(Value::Float(0.0)),
            Fconst1 => stack.push(Value::Float(1.0)),
            Fconst2 => stack.push(Value::Float(2.0)),
            Dconst0 => stack.push(Value::Double(0.0)),
            Dconst1 => stack.push(Value::Double(1.0)),

            Iaload | Laload | Faload | Daload | Aaload | Baload | Caload | Saload => {
                let index = stack.pop_int()?;
                let array = stack.pop()?;
                let value = self.array_slot(&array, index)?.clone();
                stack.push(value);
            }
            Iastore | Lastore | Fastore | Dastore | Aastore | Bastore | Castore | Sastore => {
                let value = stack.pop()?;
                let index = stack.pop_int()?;
                let array = stack.pop()?;
                *self.array_slot_mut(&array, index)? = match op {
                    Bastore => Value::Int(value_int(&value)? as i8 as i32),
                    Castore => Value::Int(value_int(&value)? as u16 as i32),
                    Sastore => Value::Int(value_int(&value)? as i16 as i32),
                    _ => value,
                };
            }
            Arraylength => {
                let array = stack.pop()?;
                let len = match self.object(&array) {
                    Some(Object::Array(items)) => items.len(),
                    _ => return Err("NullPointerException: arraylength".to_string()),
                };
                stack.push(Value::Int(len as i32));
            }

            Pop => {
                stack.raw_pop()?;
            }
            Pop2 => {
                stack.raw_pop()?;
                stack.raw_pop()?;
            }
            Dup => stack.shuffle(1, &[0, 0])?,
            DupX1 => stack.shuffle(2, &[0, 1, 0])?,
            DupX2 => stack.shuffle(3, &[0, 2, 1, 0])?,
            Dup2 => stack.shuffle(2, &[1, 0, 1, 0])?,
            Dup2X1 => stack.shuffle(3, &[1, 0, 2, 1, 0])?,
            Dup2X2 => stack.shuffle(4, &[1, 0, 3, 2, 1, 0])?,
            Swap => stack.shuffle(2, &[0, 1])?,

            Iadd | Isub | Imul | Idiv | Irem | Iand | Ior | Ixor => {
                let b = stack.pop_int()?;
                let a = stack.pop_int()?;
                if matches!(op, Idiv | Irem) && b == 0 {
                    return Err("ArithmeticException: / by zero".to_string());
                }
                stack.push(Value::Int(match op {
                    Iadd => a.wrapping_add(b),
                    Isub => a.wrapping_sub(b),
                    Imul => a.wrapping_mul(b),
                    Idiv => a.wrapping_div(b),
                    Irem => a.wrapping_rem(b),
                    Iand => a & b,
                    Ior => a | b,
                    _ => a ^ b,
                }));
            }
            Ladd | Lsub | Lmul | Ldiv | Lrem => {
                let b = stack.pop()?.as_long();
                let a = stack.pop()?.as_long();
                if matches!(op, Ldiv | Lrem) && b == 0 {
                    return Err("ArithmeticException: / by zero".to_string());
                }
                stack.push(Value::Long(match op {
                    Ladd => a.wrapping_add(b),
                    Lsub => a.wrapping_sub(b),
                    Lmul => a.wrapping_mul(b),
                    Ldiv => a.wrapping_div(b),
                    _ => a.wrapping_rem(b),
                }));
            }
            Fadd | Fsub | Fmul | Fdiv | Frem => {
                let b = stack.pop_float()?;
                let a = stack.pop_float()?;
                stack.push(Value::Float(match op {
                    Fadd => a + b,
                    Fsub => a - b,
                    Fmul => a * b,
                    Fdiv => a / b,
                    _ => a % b,
                }));
            }
            Dadd | Dsub | Dmul | Ddiv | Drem => {
                let b = stack.pop()?.as_double();
                let a = stack.pop()?.as_double();
                stack.push(Value::Double(match op {
                    Dadd => a + b,
                    Dsub => a - b,
                    Dmul => a * b,
                    Ddiv => a / b,
                    _ => a % b,
                }));
            }
            Ineg => {
                let v = stack.pop_int()?;
                stack.push(Value::Int(v.wrapping_neg()));
            }
            Lneg => {
                let v = stack.pop()?.as_long();
                stack.push(Value::Long(v.wrapping_neg()));
            }
            Fneg => {
                let v = stack.pop_float()?;
                stack.push(Value::Float(-v));
            }
            Dneg => {
                let v = stack.pop()?.as_double();
                stack.push(Value::Double(-v));
            }

            I2l | I2f | I2d | I2b | I2c | I2s => {
                let v = stack.pop_int()?;
                stack.push(match op {
                    I2l => Value::Long(i64::from(v)),
                    I2f => Value::Float(v as f32),
                    I2d => Value::Double(f64::from(v)),
                    I2b => Value::Int(v as i8 as i32),
                    I2c => Value::Int(v as u16 as i32),
                    _ => Value::Int(v as i16 as i32),
                });
            }
            L2i | L2f | L2d => {
                let v = stack.pop()?.as_long();
                stack.push(match op {
                    L2i => Value::Int(v as i32),
                    L2f => Value::Float(v as f32),
                    _ => Value::Double(v as f64),
                });
            }
            F2i | F2l | F2d => {
                let v = stack.pop_float()?;
                stack.push(match op {
                    F2i => Value::Int(v as i32),
                    F2l => Value::Long(v as i64),
                    _ => Value::Double(f64::from(v)),
                });
            }
            D2i | D2l | D2f => {
                let v = stack.pop()?.as_double();
                stack.push(match op {
                    D2i => Value::Int(v as i32),
                    D2l => Value::Long(v as i64),
                    _ => Value::Float(v as f32),
                });
            }

            Lcmp => {
                let b = stack.pop()?.as_long();
                let a = stack.pop()?.as_long();
                stack.push(Value::Int(a.cmp(&b) as i32));
            }
            Fcmpl | Fcmpg => {
                let b = stack.pop_float()?;
                let a = stack.pop_float()?;
                let nan = if op == Fcmpl { -1 } else { 1 };
                stack.push(Value::Int(a.partial_cmp(&b).map_or(nan, |o| o as i32)));
            }
            Dcmpl | Dcmpg => {
                let b = stack.pop()?.as_double();
                let a = stack.pop()?.as_double();
                let nan = if op == Dcmpl { -1 } else { 1 };
                stack.push(Value::Int(a.partial_cmp(&b).map_or(nan, |o| o as i32)));
            }

            Ireturn | Lreturn | Freturn | Dreturn | Areturn => return Ok(Some(Some(stack.pop()?))),
            Return => return Ok(Some(None)),

            other => return Err(format!("VerifyError: {} without operands", other.mnemonic())),
        }
        Ok(None)
    }

    fn branch_taken(&mut self, op: Opcode, stack: &mut Stack) -> Result<bool> {
        use Opcode::*;

        Ok(match op {
            Goto => true,
            Ifeq | Ifne | Iflt | Ifge | Ifgt | Ifle => {
                let v = stack.pop_int()?;
                match op {
                    Ifeq => v == 0,
                    Ifne => v != 0,
                    Iflt => v < 0,
                    Ifge => v >= 0,
                    Ifgt => v > 0,
                    _ => v <= 0,
                }
            }
            IfIcmpeq | IfIcmpne | IfIcmplt | IfIcmpge | IfIcmpgt | IfIcmple => {
                let b = stack.pop_int()?;
                let a = stack.pop_int()?;
                match op {
                    IfIcmpeq => a == b,
                    IfIcmpne => a != b,
                    IfIcmplt => a < b,
                    IfIcmpge => a >= b,
                    IfIcmpgt => a > b,
                    _ => a <= b,
                }
            }
            IfAcmpeq | IfAcmpne => {
                let b = stack.pop()?;
                let a = stack.pop()?;
                (a == b) == (op == IfAcmpeq)
            }
            Ifnull => stack.pop()? == Value::Null,
            Ifnonnull => stack.pop()? != Value::Null,
            other => return Err(format!("VerifyError: {} is not a branch", other.mnemonic())),
        })
    }

    fn type_op(&mut self, op: Opcode, class: &str, stack: &mut Stack) -> Result<()> {
        match op {
            Opcode::New => {
                let instance = self.new_instance(class);
                stack.push(instance);
            }
            Opcode::Anewarray => {
                let len = stack.pop_len()?;
                let array = self.alloc(Object::Array(vec![Value::Null; len]));
                stack.push(array);
            }
            Opcode::Checkcast => {
                let value = stack.pop()?;
                if value != Value::Null && !self.is_instance(&value, class) {
                    let actual = self.class_of(&value).unwrap_or("?").to_string();
                    return Err(format!("ClassCastException: {actual} cannot be cast to {class}"));
                }
                stack.push(value);
            }
            Opcode::Instanceof => {
                let value = stack.pop()?;
                let result = value != Value::Null && self.is_instance(&value, class);
                stack.push(Value::Int(i32::from(result)));
            }
            other => return Err(format!("VerifyError: {} with a class operand", other.mnemonic())),
        }
        Ok(())
    }

    fn field_op(&mut self, op: Opcode, member: &MemberRef, stack: &mut Stack) -> Result<()> {
        match op {
            Opcode::Getstatic => {
                let value = if member.owner == "java/lang/System" {
                    self.alloc(Object::PrintStream {
                        err: member.name == "err",
                    })
                } else {
                    self.statics
                        .get(&(member.owner.clone(), member.name.clone()))
                        .cloned()
                        .unwrap_or_else(|| default_value(&member.descriptor))
                };
                stack.push(value);
            }
            Opcode::Putstatic => {
                let value = stack.pop()?;
                self.statics
                    .insert((member.owner.clone(), member.name.clone()), value);
            }
            Opcode::Getfield => {
                let target = stack.pop()?;
                let value = self
                    .field(&target, &member.name)
                    .cloned()
                    .ok_or_else(|| format!("NullPointerException: getfield {}", member.name))?;
                stack.push(value);
            }
            _ => {
                let value = stack.pop()?;
                let target = stack.pop()?;
                match &target {
                    Value::Ref(id) => match &mut self.heap[*id] {
                        Object::Instance { fields, .. } => {
                            fields.insert(member.name.clone(), value);
                        }
                        _ => return Err(format!("IncompatibleClassChangeError: putfield {}", member.name)),
                    },
                    _ => return Err(format!("NullPointerException: putfield {}", member.name)),
                }
            }
        }
        Ok(())
    }

    fn invoke(
        &mut self,
        op: Opcode,
        method: &MethodRef,
        receiver: Option<Value>,
        args: Vec<Value>,
    ) -> Result<Option<Value>> {
        match (op, receiver) {
            (Opcode::Invokestatic, _) => {
                if self.classes.contains_key(&method.owner) {
                    self.call(&method.owner, &method.name, &method.descriptor, None, args)
                } else {
                    self.native_static(method, args)
                }
            }
            (_, None) | (_, Some(Value::Null)) => Err(format!(
                "NullPointerException: {}.{}",
                method.owner, method.name
            )),
            (Opcode::Invokespecial, Some(receiver)) => {
                if self.classes.contains_key(&method.owner) {
                    self.call(&method.owner, &method.name, &method.descriptor, Some(receiver), args)
                } else if method.name == "<init>" {
                    Ok(None)
                } else {
                    self.native_virtual(method, receiver, args)
                }
            }
            (_, Some(receiver)) => {
                let target = self
                    .class_of(&receiver)
                    .and_then(|class| self.resolve_virtual(class, &method.name, &method.descriptor));
                match target {
                    Some(owner) => self.call(&owner, &method.name, &method.descriptor, Some(receiver), args),
                    None => self.native_virtual(method, receiver, args),
                }
            }
        }
    }

    /// First class up the superclass chain with a body for the method.
    fn resolve_virtual(&self, class: &str, name: &str, descriptor: &str) -> Option<String> {
        let mut current = Some(class.to_string());
        while let Some(class) = current.take() {
            let record = self.classes.get(&class)?;
            if record.method(name, descriptor).is_some_and(|m| m.code.is_some()) {
                return Some(class);
            }
            current = record.superclass.clone();
        }
        None
    }

    fn native_static(&mut self, method: &MethodRef, args: Vec<Value>) -> Result<Option<Value>> {
        let value = match (method.owner.as_str(), method.name.as_str()) {
            ("java/lang/Math", "abs") => match &args[0] {
                Value::Int(v) => Value::Int(v.wrapping_abs()),
                Value::Long(v) => Value::Long(v.wrapping_abs()),
                Value::Double(v) => Value::Double(v.abs()),
                other => return Err(format!("Math.abs({other:?})")),
            },
            ("java/lang/Math", "max") => Value::Int(value_int(&args[0])?.max(value_int(&args[1])?)),
            ("java/lang/Math", "min") => Value::Int(value_int(&args[0])?.min(value_int(&args[1])?)),
            ("java/lang/Integer", "toString") => {
                let text = value_int(&args[0])?.to_string();
                self.new_string(&text)
            }
            ("java/lang/Integer", "parseInt") => {
                let text = self.string(&args[0]).ok_or("NumberFormatException: null")?;
                let parsed = text
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| format!("NumberFormatException: For input string: \"{text}\""))?;
                Value::Int(parsed)
            }
            ("java/lang/String", "valueOf") => {
                let text = self.display(&args[0], param_descriptor(&method.descriptor));
                self.new_string(&text)
            }
            ("java/lang/Class", "forName") => {
                let binary = self.string(&args[0]).ok_or("NullPointerException: forName")?;
                let internal = binary.replace('.', "/");
                if !self.classes.contains_key(&internal) {
                    return Err(format!("ClassNotFoundException: {binary}"));
                }
                self.alloc(Object::Class(internal))
            }
            _ => {
                return Err(format!(
                    "UnsatisfiedLinkError: {}.{}{}",
                    method.owner, method.name, method.descriptor
                ));
            }
        };
        Ok(Some(value))
    }

    fn native_virtual(&mut self, method: &MethodRef, receiver: Value, args: Vec<Value>) -> Result<Option<Value>> {
        let Value::Ref(id) = receiver else {
            return Err(format!("NullPointerException: {}", method.name));
        };
        let object = self.heap[id].clone();
        let name = method.name.as_str();

        let value = match (&object, name) {
            (Object::PrintStream { err }, "println" | "print") => {
                let mut text = match args.first() {
                    Some(arg) => self.display(arg, param_descriptor(&method.descriptor)),
                    None => String::new(),
                };
                if name == "println" {
                    text.push('\n');
                }
                if *err {
                    self.err.push_str(&text);
                } else {
                    self.out.push_str(&text);
                }
                return Ok(None);
            }

            (Object::Str(s), "length") => Value::Int(s.encode_utf16().count() as i32),
            (Object::Str(s), "isEmpty") => Value::Int(i32::from(s.is_empty())),
            (Object::Str(s), "charAt") => {
                let index = value_int(&args[0])?;
                let unit = usize::try_from(index)
                    .ok()
                    .and_then(|i| s.encode_utf16().nth(i))
                    .ok_or_else(|| format!("StringIndexOutOfBoundsException: {index}"))?;
                Value::Int(i32::from(unit))
            }
            (Object::Str(s), "concat") => {
                let other = self.string(&args[0]).ok_or("NullPointerException: concat")?;
                let joined = format!("{s}{other}");
                self.new_string(&joined)
            }
            (Object::Str(s), "replace") => {
                let replaced = match (&args[0], &args[1]) {
                    (Value::Int(from), Value::Int(to)) => {
                        let from = char::from_u32(*from as u32).unwrap_or('\0');
                        let to = char::from_u32(*to as u32).unwrap_or('\0');
                        s.replace(from, &to.to_string())
                    }
                    (from, to) => {
                        let from = self.string(from).ok_or("NullPointerException: replace")?;
                        let to = self.string(to).ok_or("NullPointerException: replace")?;
                        s.replace(from, to)
                    }
                };
                self.new_string(&replaced)
            }
            (Object::Str(_), "toString") => receiver,
            (Object::Str(s), "equals") => {
                Value::Int(i32::from(self.string(&args[0]) == Some(s.as_str())))
            }
            (Object::Str(s), "hashCode") => Value::Int(java_string_hash(s)),

            (Object::Class(class), "getName") => {
                let binary = class.replace('/', ".");
                self.new_string(&binary)
            }
            (Object::Class(class), "getDeclaredConstructor") => self.alloc(Object::Constructor(class.clone())),
            (Object::Constructor(class), "newInstance") => {
                let params = self.array(&args[0]).ok_or("NullPointerException: newInstance")?.to_vec();
                let descriptor = self
                    .classes
                    .get(class)
                    .and_then(|c| {
                        c.methods.iter().find(|m| {
                            m.name == "<init>"
                                && MethodDescriptor::parse(&m.descriptor)
                                    .is_ok_and(|d| d.params.len() == params.len())
                        })
                    })
                    .map(|m| m.descriptor.clone())
                    .ok_or_else(|| format!("NoSuchMethodException: {class}.<init>"))?;
                let instance = self.new_instance(class);
                self.call(class, "<init>", &descriptor, Some(instance.clone()), params)?;
                instance
            }

            (_, "getClass") => {
                let class = match &object {
                    Object::Instance { class, .. } => class.clone(),
                    Object::Str(_) => "java/lang/String".to_string(),
                    _ => "java/lang/Object".to_string(),
                };
                self.alloc(Object::Class(class))
            }
            (_, "hashCode") => Value::Int(id as i32),
            (_, "equals") => Value::Int(i32::from(args[0] == receiver)),
            (_, "toString") => {
                let text = self.display(&receiver, "Ljava/lang/Object;");
                self.new_string(&text)
            }
            _ => {
                return Err(format!(
                    "NoSuchMethodError: {}.{}{}",
                    method.owner, method.name, method.descriptor
                ));
            }
        };
        Ok(Some(value))
    }

    /// Text printed for `value` passed as a parameter of `descriptor`.
    fn display(&self, value: &Value, descriptor: &str) -> String {
        match (descriptor, value) {
            ("Z", Value::Int(v)) => (*v != 0).to_string(),
            ("C", Value::Int(v)) => char::from_u32(*v as u32).unwrap_or('\u{fffd}').to_string(),
            (_, Value::Int(v)) => v.to_string(),
            (_, Value::Long(v)) => v.to_string(),
            (_, Value::Float(v)) => java_float(f64::from(*v)),
            (_, Value::Double(v)) => java_float(*v),
            (_, Value::Null) => "null".to_string(),
            (_, Value::Top) => "<top>".to_string(),
            (_, Value::Ref(id)) => match &self.heap[*id] {
                Object::Str(s) => s.clone(),
                Object::Instance { class, .. } => format!("{}@{id:x}", class.replace('/', ".")),
                Object::Array(_) => format!("[@{id:x}"),
                Object::Class(class) => format!("class {}", class.replace('/', ".")),
                Object::Constructor(class) => format!("constructor {}", class.replace('/', ".")),
                Object::PrintStream { .. } => format!("java.io.PrintStream@{id:x}"),
            },
        }
    }

    fn array_slot(&self, array: &Value, index: i32) -> Result<&Value> {
        match self.object(array) {
            Some(Object::Array(items)) => usize::try_from(index)
                .ok()
                .and_then(|i| items.get(i))
                .ok_or_else(|| format!("ArrayIndexOutOfBoundsException: {index}")),
            _ => Err("NullPointerException: array load".to_string()),
        }
    }

    fn array_slot_mut(&mut self, array: &Value, index: i32) -> Result<&mut Value> {
        match array {
            Value::Ref(id) => match &mut self.heap[*id] {
                Object::Array(items) => usize::try_from(index)
                    .ok()
                    .and_then(|i| items.get_mut(i))
                    .ok_or_else(|| format!("ArrayIndexOutOfBoundsException: {index}")),
                _ => Err("ArrayStoreException".to_string()),
            },
            _ => Err("NullPointerException: array store".to_string()),
        }
    }
}

// =============================================================================
// Operand stack
// =============================================================================

#[derive(Debug, Default)]
struct Stack {
    slots: Vec<Value>,
}

impl Stack {
    fn push(&mut self, value: Value) {
        let wide = value.is_wide();
        self.slots.push(value);
        if wide {
            self.slots.push(Value::Top);
        }
    }

    /// Pop one value, both slots for longs and doubles.
    fn pop(&mut self) -> Result<Value> {
        match self.raw_pop()? {
            Value::Top => self.raw_pop(),
            value => Ok(value),
        }
    }

    fn raw_pop(&mut self) -> Result<Value> {
        self.slots.pop().ok_or_else(|| "VerifyError: stack underflow".to_string())
    }

    fn pop_int(&mut self) -> Result<i32> {
        value_int(&self.pop()?)
    }

    fn pop_float(&mut self) -> Result<f32> {
        match self.pop()? {
            Value::Float(v) => Ok(v),
            other => Err(format!("VerifyError: expected float, found {other:?}")),
        }
    }

    fn pop_len(&mut self) -> Result<usize> {
        let len = self.pop_int()?;
        usize::try_from(len).map_err(|_| format!("NegativeArraySizeException: {len}"))
    }

    /// Pop `count` raw slots and push them back in `order`, where 0 is the
    /// slot that was on top.
    fn shuffle(&mut self, count: usize, order: &[usize]) -> Result<()> {
        if self.slots.len() < count {
            return Err("VerifyError: stack underflow".to_string());
        }
        let top: Vec<Value> = self.slots.split_off(self.slots.len() - count);
        for &i in order {
            self.slots.push(top[count - 1 - i].clone());
        }
        Ok(())
    }
}

fn value_int(value: &Value) -> Result<i32> {
    match value {
        Value::Int(v) => Ok(*v),
        other => Err(format!("VerifyError: expected int, found {other:?}")),
    }
}

fn default_value(descriptor: &str) -> Value {
    match descriptor.as_bytes().first() {
        Some(b'J') => Value::Long(0),
        Some(b'F') => Value::Float(0.0),
        Some(b'D') => Value::Double(0.0),
        Some(b'L') | Some(b'[') => Value::Null,
        _ => Value::Int(0),
    }
}

/// Default element for a `NEWARRAY` type code.
fn atype_default(atype: i32) -> Value {
    match atype {
        6 => Value::Float(0.0),
        7 => Value::Double(0.0),
        11 => Value::Long(0),
        _ => Value::Int(0),
    }
}

/// Descriptor of the single parameter of a one-argument method.
fn param_descriptor(descriptor: &str) -> &str {
    descriptor
        .strip_prefix('(')
        .and_then(|rest| rest.split_once(')'))
        .map_or("", |(params, _)| params)
}

fn java_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e7 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

fn java_string_hash(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
}
