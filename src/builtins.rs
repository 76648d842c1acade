use std::{path::Path, rc::Rc};

use crate::{
    environment::Environment,
    error::{EvalError, EvalResult},
    interpreter::Interpreter,
    value::Value,
};

/// Identity of a native operation. Two builtin values are equal exactly when
/// they carry the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    List,
    Head,
    Tail,
    Eval,
    Join,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Lambda,
    Def,
    Put,
    If,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    Load,
    Print,
    Error,
    Exit,
    PrintEnv,
}

impl Builtin {
    pub const ALL: [Builtin; 26] = [
        Builtin::List,
        Builtin::Head,
        Builtin::Tail,
        Builtin::Eval,
        Builtin::Join,
        Builtin::Add,
        Builtin::Sub,
        Builtin::Mul,
        Builtin::Div,
        Builtin::Mod,
        Builtin::Pow,
        Builtin::Lambda,
        Builtin::Def,
        Builtin::Put,
        Builtin::If,
        Builtin::Eq,
        Builtin::Ne,
        Builtin::Gt,
        Builtin::Lt,
        Builtin::Ge,
        Builtin::Le,
        Builtin::Load,
        Builtin::Print,
        Builtin::Error,
        Builtin::Exit,
        Builtin::PrintEnv,
    ];

    /// The symbol the builtin is bound to in the global scope.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::List => "list",
            Builtin::Head => "head",
            Builtin::Tail => "tail",
            Builtin::Eval => "eval",
            Builtin::Join => "join",
            Builtin::Add => "+",
            Builtin::Sub => "-",
            Builtin::Mul => "*",
            Builtin::Div => "/",
            Builtin::Mod => "%",
            Builtin::Pow => "^",
            Builtin::Lambda => "\\",
            Builtin::Def => "def",
            Builtin::Put => "=",
            Builtin::If => "if",
            Builtin::Eq => "==",
            Builtin::Ne => "!=",
            Builtin::Gt => ">",
            Builtin::Lt => "<",
            Builtin::Ge => ">=",
            Builtin::Le => "<=",
            Builtin::Load => "load",
            Builtin::Print => "print",
            Builtin::Error => "error",
            Builtin::Exit => "exit",
            Builtin::PrintEnv => "print_env",
        }
    }

    /// Runs the operation. Invalid input never escapes as anything but an
    /// `Error` value.
    pub fn call(self, interpreter: &Interpreter, env: &Rc<Environment>, args: Vec<Value>) -> Value {
        let result = match self {
            Builtin::List => Ok(Value::QExpr(args)),
            Builtin::Head => builtin_head(args),
            Builtin::Tail => builtin_tail(args),
            Builtin::Eval => builtin_eval(interpreter, env, args),
            Builtin::Join => builtin_join(args),
            Builtin::Add
            | Builtin::Sub
            | Builtin::Mul
            | Builtin::Div
            | Builtin::Mod
            | Builtin::Pow => self.arithmetic(args),
            Builtin::Lambda => builtin_lambda(args),
            Builtin::Def | Builtin::Put => self.bind(env, args),
            Builtin::If => builtin_if(interpreter, env, args),
            Builtin::Eq | Builtin::Ne => self.compare(args),
            Builtin::Gt | Builtin::Lt | Builtin::Ge | Builtin::Le => self.order(args),
            Builtin::Load => builtin_load(interpreter, env, args),
            Builtin::Print => builtin_print(interpreter, args),
            Builtin::Error => builtin_error(args),
            Builtin::Exit => Ok(Value::Exit),
            Builtin::PrintEnv => builtin_print_env(interpreter, env),
        };
        result.unwrap_or_else(Value::from)
    }

    fn arithmetic(self, args: Vec<Value>) -> EvalResult<Value> {
        let func = self.name();
        let numbers = args
            .iter()
            .enumerate()
            .map(|(index, value)| number_arg(func, index, value))
            .collect::<EvalResult<Vec<i64>>>()?;
        let (&first, rest) = numbers.split_first().ok_or(EvalError::ArityMismatch {
            func,
            got: 0,
            expected: 1,
        })?;

        if self == Builtin::Sub && rest.is_empty() {
            return Ok(Value::Number(first.wrapping_neg()));
        }

        rest.iter()
            .try_fold(first, |acc, &y| match self {
                Builtin::Add => Ok(acc.wrapping_add(y)),
                Builtin::Sub => Ok(acc.wrapping_sub(y)),
                Builtin::Mul => Ok(acc.wrapping_mul(y)),
                Builtin::Div if y == 0 => Err(EvalError::DivisionByZero),
                Builtin::Div => Ok(acc.wrapping_div(y)),
                Builtin::Mod if y == 0 => Err(EvalError::DivisionByZero),
                Builtin::Mod => Ok(acc.wrapping_rem(y)),
                _ => integer_pow(acc, y),
            })
            .map(Value::Number)
    }

    fn order(self, args: Vec<Value>) -> EvalResult<Value> {
        let func = self.name();
        expect_count(func, &args, 2)?;
        let x = number_arg(func, 0, &args[0])?;
        let y = number_arg(func, 1, &args[1])?;
        let truth = match self {
            Builtin::Gt => x > y,
            Builtin::Lt => x < y,
            Builtin::Ge => x >= y,
            _ => x <= y,
        };
        Ok(Value::bool(truth))
    }

    fn compare(self, args: Vec<Value>) -> EvalResult<Value> {
        expect_count(self.name(), &args, 2)?;
        let equal = args[0] == args[1];
        Ok(Value::bool(if self == Builtin::Eq { equal } else { !equal }))
    }

    /// `def` binds in the global scope, `=` in the calling one.
    fn bind(self, env: &Rc<Environment>, args: Vec<Value>) -> EvalResult<Value> {
        let func = self.name();
        let mut args = args.into_iter();
        let symbols = match args.next() {
            Some(first) => qexpr_arg(func, 0, first)?,
            None => {
                return Err(EvalError::ArityMismatch {
                    func,
                    got: 0,
                    expected: 1,
                })
            }
        };
        let names = symbol_names(func, symbols)?;
        let values: Vec<Value> = args.collect();
        if names.len() != values.len() {
            return Err(EvalError::ArityMismatch {
                func,
                got: values.len(),
                expected: names.len(),
            });
        }

        for (name, value) in names.into_iter().zip(values) {
            if self == Builtin::Def {
                env.set_global(name, value);
            } else {
                env.set_local(name, value);
            }
        }
        Ok(Value::empty_sexpr())
    }
}

fn integer_pow(base: i64, exponent: i64) -> EvalResult<i64> {
    if exponent < 0 {
        return match base {
            0 => Err(EvalError::DivisionByZero),
            1 => Ok(1),
            -1 => Ok(if exponent % 2 == 0 { 1 } else { -1 }),
            _ => Ok(0),
        };
    }
    let mut result: i64 = 1;
    let mut base = base;
    let mut exponent = exponent.unsigned_abs();
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = result.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exponent >>= 1;
    }
    Ok(result)
}

fn expect_count(func: &'static str, args: &[Value], expected: usize) -> EvalResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvalError::ArityMismatch {
            func,
            got: args.len(),
            expected,
        })
    }
}

fn wrong_type(func: &'static str, index: usize, got: &Value, expected: &'static str) -> EvalError {
    EvalError::WrongType {
        func,
        index,
        got: got.type_name(),
        expected,
    }
}

fn number_arg(func: &'static str, index: usize, value: &Value) -> EvalResult<i64> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(wrong_type(func, index, other, "Number")),
    }
}

fn qexpr_arg(func: &'static str, index: usize, value: Value) -> EvalResult<Vec<Value>> {
    match value {
        Value::QExpr(cells) => Ok(cells),
        other => Err(wrong_type(func, index, &other, "Q-expression")),
    }
}

fn string_arg(func: &'static str, index: usize, value: Value) -> EvalResult<String> {
    match value {
        Value::String(text) => Ok(text),
        other => Err(wrong_type(func, index, &other, "String")),
    }
}

fn symbol_names(func: &'static str, cells: Vec<Value>) -> EvalResult<Vec<String>> {
    cells
        .into_iter()
        .map(|cell| match cell {
            Value::Symbol(name) => Ok(name),
            other => Err(EvalError::NonSymbol {
                func,
                got: other.type_name(),
            }),
        })
        .collect()
}

/// Checks the count and the Q-expression type of the only argument of
/// `head`, `tail` and `eval`.
fn single_qexpr(func: &'static str, args: Vec<Value>) -> EvalResult<Vec<Value>> {
    expect_count(func, &args, 1)?;
    let mut args = args.into_iter();
    match args.next() {
        Some(value) => qexpr_arg(func, 0, value),
        None => Err(EvalError::ArityMismatch {
            func,
            got: 0,
            expected: 1,
        }),
    }
}

fn builtin_head(args: Vec<Value>) -> EvalResult<Value> {
    let mut cells = single_qexpr("head", args)?;
    if cells.is_empty() {
        return Err(EvalError::EmptyList {
            func: "head",
            index: 0,
        });
    }
    cells.truncate(1);
    Ok(Value::QExpr(cells))
}

fn builtin_tail(args: Vec<Value>) -> EvalResult<Value> {
    let mut cells = single_qexpr("tail", args)?;
    if cells.is_empty() {
        return Err(EvalError::EmptyList {
            func: "tail",
            index: 0,
        });
    }
    cells.remove(0);
    Ok(Value::QExpr(cells))
}

fn builtin_eval(
    interpreter: &Interpreter,
    env: &Rc<Environment>,
    args: Vec<Value>,
) -> EvalResult<Value> {
    let cells = single_qexpr("eval", args)?;
    Ok(interpreter.eval(env, Value::SExpr(cells)))
}

fn builtin_join(args: Vec<Value>) -> EvalResult<Value> {
    let mut joined = Vec::new();
    for (index, value) in args.into_iter().enumerate() {
        joined.extend(qexpr_arg("join", index, value)?);
    }
    Ok(Value::QExpr(joined))
}

fn builtin_lambda(args: Vec<Value>) -> EvalResult<Value> {
    expect_count("\\", &args, 2)?;
    let mut args = args.into_iter();
    let (Some(formals), Some(body)) = (args.next(), args.next()) else {
        return Err(EvalError::ArityMismatch {
            func: "\\",
            got: 0,
            expected: 2,
        });
    };
    let formals = qexpr_arg("\\", 0, formals)?;
    let body = qexpr_arg("\\", 1, body)?;
    let formals = formals
        .into_iter()
        .map(|cell| match cell {
            Value::Symbol(name) => Ok(name),
            other => Err(EvalError::NonSymbolFormal {
                got: other.type_name(),
            }),
        })
        .collect::<EvalResult<Vec<String>>>()?;
    Ok(Value::lambda(formals, body))
}

fn builtin_if(
    interpreter: &Interpreter,
    env: &Rc<Environment>,
    args: Vec<Value>,
) -> EvalResult<Value> {
    expect_count("if", &args, 3)?;
    let mut args = args.into_iter();
    let (Some(condition), Some(then), Some(otherwise)) = (args.next(), args.next(), args.next())
    else {
        return Err(EvalError::ArityMismatch {
            func: "if",
            got: 0,
            expected: 3,
        });
    };
    let condition = number_arg("if", 0, &condition)?;
    let then = qexpr_arg("if", 1, then)?;
    let otherwise = qexpr_arg("if", 2, otherwise)?;

    let branch = if condition != 0 { then } else { otherwise };
    Ok(interpreter.eval(env, Value::SExpr(branch)))
}

fn builtin_load(
    interpreter: &Interpreter,
    env: &Rc<Environment>,
    args: Vec<Value>,
) -> EvalResult<Value> {
    expect_count("load", &args, 1)?;
    let path = match args.into_iter().next() {
        Some(value) => string_arg("load", 0, value)?,
        None => {
            return Err(EvalError::ArityMismatch {
                func: "load",
                got: 0,
                expected: 1,
            })
        }
    };
    Ok(interpreter.load_file(env, Path::new(&path)))
}

fn builtin_print(interpreter: &Interpreter, args: Vec<Value>) -> EvalResult<Value> {
    let line = args
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    interpreter.emit(&line);
    Ok(Value::empty_sexpr())
}

fn builtin_error(args: Vec<Value>) -> EvalResult<Value> {
    expect_count("error", &args, 1)?;
    match args.into_iter().next() {
        Some(value) => Ok(Value::Error(string_arg("error", 0, value)?)),
        None => Err(EvalError::ArityMismatch {
            func: "error",
            got: 0,
            expected: 1,
        }),
    }
}

fn builtin_print_env(interpreter: &Interpreter, env: &Rc<Environment>) -> EvalResult<Value> {
    for (name, value) in env.local_bindings() {
        interpreter.emit(&format!("{}: {}", name, value));
    }
    Ok(Value::empty_sexpr())
}
