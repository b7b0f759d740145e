//! Method body compilation (pass 3).
//!
//! Each [`BodyJob`] is compiled against the frozen [`StructuralIndex`] with
//! a fresh [`MethodContext`]. Void methods whose end is reachable get an
//! implicit `RETURN`; any other method must return on every path.

use atypical_core::{AtypicalError, CompilationError};
use atypical_parser::ast::FunctionDecl;
use atypical_registry::{MethodSig, StructuralIndex, TypeDecl};

use super::{BodyJob, BodyMap, MethodKey, SourceUnit};
use crate::bytecode::{Code, Opcode};
use crate::context::MethodContext;
use crate::emit::CodeEmitter;
use crate::options::CompilerOptions;
use crate::return_checker::always_returns;
use crate::stmt::StmtCompiler;

/// Compile every job into `bodies`, in job order.
#[tracing::instrument(skip_all, fields(jobs = jobs.len()))]
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile_bodies(
    index: &StructuralIndex,
    units: &[SourceUnit<'_>],
    holders: &[Option<String>],
    jobs: &[(MethodKey, BodyJob<'_>)],
    options: &CompilerOptions,
    bodies: &mut BodyMap,
) -> Result<(), AtypicalError> {
    for (key, job) in jobs {
        let unit = &units[job.unit];
        let wrap = |source| AtypicalError::Compilation {
            file: unit.name.to_string(),
            source,
        };

        let (owner, sig) = lookup(index, key).map_err(wrap)?;
        let holder = holders[job.unit].as_deref().and_then(|name| index.get(name));
        let ctx = MethodContext::new(index, unit.file.aliases(), options, owner, sig).with_holder(holder);

        let code = compile_method(ctx, job.decl).map_err(wrap)?;
        tracing::trace!(method = %key, max_locals = code.max_locals, "compiled body");
        bodies.insert(key.clone(), code);
    }
    Ok(())
}

/// Compile one method body.
pub fn compile_method(mut ctx: MethodContext<'_>, decl: &FunctionDecl<'_>) -> Result<Code, CompilationError> {
    let mut emitter = if ctx.options.line_numbers {
        CodeEmitter::with_line_numbers()
    } else {
        CodeEmitter::new()
    };
    ctx.declare_params()?;

    let return_type = ctx.method.ret.clone();
    StmtCompiler::new(&mut ctx, &mut emitter, return_type.clone()).compile_body(decl.body.stmts)?;

    if return_type.is_void() {
        if emitter.is_reachable_end() {
            emitter.emit(Opcode::Return);
        }
    } else if !always_returns(&decl.body) {
        return Err(CompilationError::MissingReturn {
            method: ctx.method.name.clone(),
            span: decl.span,
        });
    }

    emitter.finish(ctx.scope.max_locals())
}

fn lookup<'i>(index: &'i StructuralIndex, key: &MethodKey) -> Result<(&'i TypeDecl, &'i MethodSig), CompilationError> {
    let owner = index
        .get(&key.owner)
        .ok_or_else(|| CompilationError::internal(format!("no declaration for {key}")))?;
    let sig = owner
        .methods_named(&key.name)
        .find(|m| m.descriptor().to_string() == key.descriptor)
        .ok_or_else(|| CompilationError::internal(format!("no signature for {key}")))?;
    Ok((owner, sig))
}

#[cfg(test)]
mod tests {
    use atypical_core::CompilationError;

    use crate::bytecode::{Instruction, Opcode};
    use crate::options::CompilerOptions;
    use crate::test_support::{compile_err, compile_ok, compile_with, method_code, ops};

    #[test]
    fn void_method_gets_implicit_return() {
        let classes = compile_ok("fn f(): void { }\nfn g() { let x = 1; }");
        assert_eq!(ops(&classes, "main", "f"), vec![Opcode::Return]);
        assert_eq!(
            ops(&classes, "main", "g"),
            vec![Opcode::Iconst1, Opcode::Istore, Opcode::Return]
        );
    }

    #[test]
    fn explicit_return_is_not_doubled() {
        let classes = compile_ok("fn f() { return; }");
        assert_eq!(ops(&classes, "main", "f"), vec![Opcode::Return]);
    }

    #[test]
    fn missing_return_is_reported() {
        let err = compile_err("fn f(x: bool): int { if (x) { return 1; } }");
        match err.as_compilation() {
            Some(CompilationError::MissingReturn { method, span }) => {
                assert_eq!(method, "f");
                assert_eq!(span.line, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(err.file(), Some("main.atp"));
    }

    #[test]
    fn loop_does_not_count_as_returning() {
        let err = compile_err("fn f(): int { while (true) { return 1; } }");
        assert!(matches!(err.as_compilation(), Some(CompilationError::MissingReturn { .. })));
    }

    #[test]
    fn instance_methods_reserve_this() {
        let classes = compile_ok(
            "module Counter {\n\
               struct { count: int; }\n\
               impl { fn add(n: long): long { return n; } }\n\
             }",
        );
        let code = method_code(&classes, "Counter", "add");
        // this, n (2)
        assert_eq!(code.max_locals, 3);
        assert_eq!(code.instructions[0], Instruction::Local(Opcode::Lload, 1));
    }

    #[test]
    fn line_numbers_follow_statements() {
        let options = CompilerOptions::default().with_line_numbers(true);
        let classes = compile_with("fn f(): int {\n  let x = 1;\n  return x;\n}", &options);
        let lines: Vec<_> = method_code(&classes, "main", "f")
            .instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::Line(line) => Some(*line),
                _ => None,
            })
            .collect();
        assert_eq!(lines, vec![2, 3]);
    }
}
