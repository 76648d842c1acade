use std::{fmt, rc::Rc};

use crate::{builtins::Builtin, environment::Environment, error::EvalError};

/// A runtime value. Values are owned trees: `clone` is the deep copy the
/// language relies on, so nothing obtained from a scope or a list is ever
/// shared with the original.
#[derive(Clone, PartialEq)]
pub enum Value {
    Number(i64),
    Error(String),
    Symbol(String),
    String(String),
    SExpr(Vec<Value>),
    QExpr(Vec<Value>),
    Function(Function),
    Exit,
}

#[derive(Clone, PartialEq)]
pub enum Function {
    Builtin(Builtin),
    Closure(Closure),
}

/// A user-defined function. `formals` are the parameter names still waiting
/// for an argument, `body` is the contents of the body Q-expression and `env`
/// holds the arguments bound so far.
pub struct Closure {
    pub formals: Vec<String>,
    pub body: Vec<Value>,
    pub env: Rc<Environment>,
}

impl Closure {
    pub fn new(formals: Vec<String>, body: Vec<Value>) -> Self {
        Self {
            formals,
            body,
            env: Environment::new(),
        }
    }
}

impl Clone for Closure {
    fn clone(&self) -> Self {
        Self {
            formals: self.formals.clone(),
            body: self.body.clone(),
            env: self.env.copy(),
        }
    }
}

impl PartialEq for Closure {
    // The captured scope takes no part in equality.
    fn eq(&self, other: &Self) -> bool {
        self.formals == other.formals && self.body == other.body
    }
}

impl Value {
    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(name.into())
    }

    pub fn string(text: impl Into<String>) -> Self {
        Value::String(text.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Value::Error(message.into())
    }

    pub fn empty_sexpr() -> Self {
        Value::SExpr(Vec::new())
    }

    pub fn empty_qexpr() -> Self {
        Value::QExpr(Vec::new())
    }

    pub fn builtin(builtin: Builtin) -> Self {
        Value::Function(Function::Builtin(builtin))
    }

    pub fn lambda(formals: Vec<String>, body: Vec<Value>) -> Self {
        Value::Function(Function::Closure(Closure::new(formals, body)))
    }

    pub fn bool(truth: bool) -> Self {
        Value::Number(i64::from(truth))
    }

    /// Name of the value's kind as it appears in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "Number",
            Value::Error(_) => "Error",
            Value::Symbol(_) => "Symbol",
            Value::String(_) => "String",
            Value::SExpr(_) => "S-expression",
            Value::QExpr(_) => "Q-expression",
            Value::Function(_) => "Function",
            Value::Exit => "Exit",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
}

impl From<EvalError> for Value {
    fn from(err: EvalError) -> Self {
        Value::Error(err.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Error(message) => write!(f, "Error: {}", message),
            Value::Symbol(name) => write!(f, "{}", name),
            Value::String(text) => write!(f, "\"{}\"", escape(text)),
            Value::SExpr(cells) => write_cells(f, cells, '(', ')'),
            Value::QExpr(cells) => write_cells(f, cells, '{', '}'),
            Value::Function(func) => write!(f, "{}", func),
            Value::Exit => write!(f, "Exit call..."),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Builtin(_) => write!(f, "<builtin>"),
            Function::Closure(closure) => {
                write!(f, "(\\ {{{}}} ", closure.formals.join(" "))?;
                write_cells(f, &closure.body, '{', '}')?;
                write!(f, ")")
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Builtin(builtin) => write!(f, "<builtin {}>", builtin.name()),
            Function::Closure(_) => fmt::Display::fmt(self, f),
        }
    }
}

fn write_cells(f: &mut fmt::Formatter<'_>, cells: &[Value], open: char, close: char) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", cell)?;
    }
    write!(f, "{}", close)
}

/// Inverse of the reader's unescaping, used when printing strings.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0b' => out.push_str("\\v"),
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\0' => out.push_str("\\0"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn qexpr(items: &[i64]) -> Value {
        Value::QExpr(items.iter().copied().map(Value::Number).collect())
    }

    #[test]
    fn structural_equality_on_lists() {
        assert_eq!(qexpr(&[1, 2, 3]), qexpr(&[1, 2, 3]));
        assert_ne!(qexpr(&[1, 2]), qexpr(&[1, 2, 3]));
        assert_ne!(
            Value::SExpr(vec![Value::Number(1)]),
            Value::QExpr(vec![Value::Number(1)])
        );
        assert_ne!(Value::string("x"), Value::symbol("x"));
        assert_eq!(Value::error("boom"), Value::error("boom"));
    }

    #[test]
    fn builtins_compare_by_identity() {
        assert_eq!(Value::builtin(Builtin::Add), Value::builtin(Builtin::Add));
        assert_ne!(Value::builtin(Builtin::Add), Value::builtin(Builtin::Sub));
    }

    #[test]
    fn closures_ignore_their_scope_when_compared() {
        let body = vec![Value::symbol("+"), Value::symbol("x"), Value::Number(1)];
        let left = Closure::new(vec!["x".to_string()], body.clone());
        let right = Closure::new(vec!["x".to_string()], body);
        right.env.set_local("unrelated", Value::Number(9));
        assert!(left == right);

        let other = Closure::new(vec!["y".to_string()], Vec::new());
        assert!(left != other);
    }

    #[test]
    fn cloning_a_closure_copies_its_scope() {
        let original = Closure::new(vec!["y".to_string()], Vec::new());
        original.env.set_local("x", Value::Number(1));

        let copy = original.clone();
        copy.env.set_local("x", Value::Number(2));

        assert_eq!(original.env.get("x"), Ok(Value::Number(1)));
        assert_eq!(copy.env.get("x"), Ok(Value::Number(2)));
        assert!(!Rc::ptr_eq(&original.env, &copy.env));
    }

    #[test]
    fn type_names_for_diagnostics() {
        assert_eq!(Value::Number(1).type_name(), "Number");
        assert_eq!(Value::empty_sexpr().type_name(), "S-expression");
        assert_eq!(Value::empty_qexpr().type_name(), "Q-expression");
        assert_eq!(Value::builtin(Builtin::Head).type_name(), "Function");
    }

    #[test]
    fn display_matches_source_notation() {
        let value = Value::SExpr(vec![
            Value::symbol("+"),
            Value::Number(-4),
            Value::QExpr(vec![Value::string("a\"b\n")]),
        ]);
        assert_eq!(value.to_string(), "(+ -4 {\"a\\\"b\\n\"})");
        assert_eq!(Value::error("boom").to_string(), "Error: boom");
        assert_eq!(Value::builtin(Builtin::Add).to_string(), "<builtin>");
        assert_eq!(Value::empty_sexpr().to_string(), "()");

        let lambda = Value::lambda(
            vec!["x".to_string(), "y".to_string()],
            vec![Value::symbol("+"), Value::symbol("x"), Value::symbol("y")],
        );
        assert_eq!(lambda.to_string(), "(\\ {x y} {+ x y})");
    }
}
