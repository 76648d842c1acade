use std::{
    cell::RefCell,
    collections::VecDeque,
    io::{self, Write},
    path::Path,
    rc::Rc,
};

use tracing::{debug, trace, warn};

use crate::{
    builtins::Builtin,
    environment::Environment,
    error::{EvalError, EvalResult, LangResult},
    parser, reader,
    value::{Closure, Function, Value},
};

/// Owns the global scope and the sink that `print`, `print_env` and `load`
/// report to.
pub struct Interpreter {
    global: Rc<Environment>,
    output: RefCell<Box<dyn Write>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    pub fn with_output(output: Box<dyn Write>) -> Self {
        let interpreter = Self {
            global: Environment::new(),
            output: RefCell::new(output),
        };
        interpreter.install_builtins();
        interpreter
    }

    fn install_builtins(&self) {
        for builtin in Builtin::ALL {
            self.global.set_local(builtin.name(), Value::builtin(builtin));
        }
    }

    pub fn global(&self) -> &Rc<Environment> {
        &self.global
    }

    /// Parses `source` and evaluates the whole of it as one compound form in
    /// the global scope, the way the interactive prompt treats a line.
    pub fn eval_source(&self, source: &str) -> LangResult<Value> {
        let root = parser::parse(source)?;
        Ok(self.eval(&self.global, reader::read(&root)))
    }

    pub fn eval(&self, env: &Rc<Environment>, value: Value) -> Value {
        match value {
            Value::Symbol(name) => env.get(&name).unwrap_or_else(Value::from),
            Value::SExpr(cells) => self.eval_sexpr(env, cells),
            other => other,
        }
    }

    fn eval_sexpr(&self, env: &Rc<Environment>, cells: Vec<Value>) -> Value {
        // Every child is evaluated before any of them is inspected.
        let mut cells: Vec<Value> = cells.into_iter().map(|cell| self.eval(env, cell)).collect();

        if let Some(index) = cells.iter().position(Value::is_error) {
            return cells.swap_remove(index);
        }

        if cells.len() <= 1 {
            return cells.pop().unwrap_or_else(Value::empty_sexpr);
        }

        let operator = cells.remove(0);
        match operator {
            Value::Exit => Value::Exit,
            Value::Function(func) => self.apply(env, func, cells),
            other => EvalError::NotAFunction {
                got: other.type_name(),
            }
            .into(),
        }
    }

    /// Applies `func` to `args` on behalf of the scope `env`.
    pub fn apply(&self, env: &Rc<Environment>, func: Function, args: Vec<Value>) -> Value {
        match func {
            Function::Builtin(builtin) => builtin.call(self, env, args),
            Function::Closure(closure) => self
                .call_closure(env, closure, args)
                .unwrap_or_else(Value::from),
        }
    }

    fn call_closure(
        &self,
        env: &Rc<Environment>,
        closure: Closure,
        args: Vec<Value>,
    ) -> EvalResult<Value> {
        let Closure {
            formals,
            body,
            env: scope,
        } = closure;
        let given = args.len();
        let expected = formals.len();
        let mut formals: VecDeque<String> = formals.into();
        let mut args: VecDeque<Value> = args.into();

        while let Some(arg) = args.pop_front() {
            let formal = formals
                .pop_front()
                .ok_or(EvalError::TooManyArguments { given, expected })?;

            if formal == "&" {
                let rest = variadic_formal(&mut formals)?;
                let collected = std::iter::once(arg).chain(args.drain(..)).collect();
                scope.set_local(rest, Value::QExpr(collected));
                break;
            }

            scope.set_local(formal, arg);
        }

        // A variadic tail that received nothing is bound to the empty list.
        if formals.front().is_some_and(|formal| formal == "&") {
            formals.pop_front();
            let rest = variadic_formal(&mut formals)?;
            scope.set_local(rest, Value::empty_qexpr());
        }

        if formals.is_empty() {
            trace!(given, expected, "closure fully applied");
            scope.set_parent(env);
            Ok(self.eval(&scope, Value::SExpr(body)))
        } else {
            trace!(given, remaining = formals.len(), "closure partially applied");
            Ok(Value::Function(Function::Closure(Closure {
                formals: formals.into(),
                body,
                env: scope,
            })))
        }
    }

    /// Evaluates every top-level form of the file at `path` in `env`. Forms
    /// that evaluate to an error are reported and the rest still run.
    #[tracing::instrument(level = "debug", skip(self, env))]
    pub fn load_file(&self, env: &Rc<Environment>, path: &Path) -> Value {
        let root = match parser::parse_file(path) {
            Ok(root) => root,
            Err(err) => return EvalError::LoadFailed(err.to_string()).into(),
        };
        let forms = match reader::read(&root) {
            Value::SExpr(forms) => forms,
            other => vec![other],
        };
        debug!(forms = forms.len(), "evaluating loaded forms");

        for form in forms {
            let result = self.eval(env, form);
            if let Value::Error(message) = &result {
                warn!(%message, "form evaluated to an error");
                self.emit(&result.to_string());
            }
        }
        Value::empty_sexpr()
    }

    /// Loads `path` into the global scope.
    pub fn load(&self, path: &Path) -> Value {
        self.load_file(&self.global, path)
    }

    /// Writes one line to the interpreter's output.
    pub fn emit(&self, line: &str) {
        let mut output = self.output.borrow_mut();
        if let Err(err) = writeln!(output, "{}", line).and_then(|()| output.flush()) {
            warn!(%err, "failed to write output");
        }
    }
}

/// Takes the name after `&`, which must be the last formal.
fn variadic_formal(formals: &mut VecDeque<String>) -> EvalResult<String> {
    match (formals.pop_front(), formals.is_empty()) {
        (Some(name), true) => Ok(name),
        _ => Err(EvalError::InvalidVariadic),
    }
}
