// Node types produced from the tagged tree
//
// Closed alternatives (accessor, statement kind, expression form, operator)
// are enums matched exhaustively; a new alternative is a compile-time
// omission, never a silent default.

use serde_json::Value;

use crate::error::CompileError;

// ============================================================================
// Accessors
// ============================================================================

/// Parameter-passing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Accessor {
    /// Immutable, non-owning reference.
    #[default]
    Look,
    /// Mutable, non-owning reference.
    Mutate,
    /// Ownership transferred; the source binding is invalidated.
    Move,
    /// Value duplicated; the caller's original is unaffected.
    Copy,
}

impl Accessor {
    /// Resolve an explicit accessor token. Look is only ever the default
    /// (absent token), so the accepted tokens are exactly these three.
    pub fn from_token(token: &str) -> Result<Self, CompileError> {
        match token {
            "mutate" => Ok(Accessor::Mutate),
            "move" => Ok(Accessor::Move),
            "copy" => Ok(Accessor::Copy),
            other => Err(CompileError::InvalidAccessor(other.to_string())),
        }
    }

    pub fn resolve(token: Option<&str>) -> Result<Self, CompileError> {
        match token {
            Some(t) => Accessor::from_token(t),
            None => Ok(Accessor::Look),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Accessor::Look => "look",
            Accessor::Mutate => "mutate",
            Accessor::Move => "move",
            Accessor::Copy => "copy",
        }
    }

    /// Parameters passed this way are references inside the callee.
    pub fn is_reference(self) -> bool {
        matches!(self, Accessor::Look | Accessor::Mutate)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDecl {
    pub name: String,
    /// Opaque type tree, passed through untouched until signature emission.
    pub declared_type: Value,
    pub accessor: Accessor,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Print,
    Var,
    Const,
    Set,
    Run,
    Return,
    Break,
    Continue,
    While,
    For,
    If,
    Match,
}

impl StatementKind {
    pub const ALL: [StatementKind; 12] = [
        StatementKind::Print,
        StatementKind::Var,
        StatementKind::Const,
        StatementKind::Set,
        StatementKind::Run,
        StatementKind::Return,
        StatementKind::Break,
        StatementKind::Continue,
        StatementKind::While,
        StatementKind::For,
        StatementKind::If,
        StatementKind::Match,
    ];

    pub fn from_tag(tag: &str) -> Result<Self, CompileError> {
        match tag {
            "print_statement" => Ok(StatementKind::Print),
            "var_statement" => Ok(StatementKind::Var),
            "const_statement" => Ok(StatementKind::Const),
            "set_statement" => Ok(StatementKind::Set),
            "run_statement" => Ok(StatementKind::Run),
            "return_statement" => Ok(StatementKind::Return),
            "break_statement" => Ok(StatementKind::Break),
            "continue_statement" => Ok(StatementKind::Continue),
            "while_loop" => Ok(StatementKind::While),
            "for_loop" => Ok(StatementKind::For),
            "if_block" => Ok(StatementKind::If),
            "match_block" => Ok(StatementKind::Match),
            other => Err(CompileError::unknown("statement kind", other)),
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            StatementKind::Print => "print_statement",
            StatementKind::Var => "var_statement",
            StatementKind::Const => "const_statement",
            StatementKind::Set => "set_statement",
            StatementKind::Run => "run_statement",
            StatementKind::Return => "return_statement",
            StatementKind::Break => "break_statement",
            StatementKind::Continue => "continue_statement",
            StatementKind::While => "while_loop",
            StatementKind::For => "for_loop",
            StatementKind::If => "if_block",
            StatementKind::Match => "match_block",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Print(Vec<Expr>),
    Var {
        name: String,
        declared_type: Option<Value>,
        value: Expr,
    },
    Const {
        name: String,
        declared_type: Option<Value>,
        value: Expr,
    },
    /// `target` is a plain identifier or a place built from field accesses
    /// and index calls.
    Set {
        target: Expr,
        op: AssignOp,
        value: Expr,
    },
    Run(Expr),
    Return(Option<Expr>),
    Break,
    Continue,
    While {
        condition: Expr,
        body: Vec<Statement>,
    },
    For {
        variable: String,
        range: ForRange,
        body: Vec<Statement>,
    },
    If {
        branches: Vec<(Expr, Vec<Statement>)>,
        otherwise: Option<Vec<Statement>>,
    },
    Match {
        subject: Expr,
        arms: Vec<(Vec<Expr>, Vec<Statement>)>,
        otherwise: Option<Vec<Statement>>,
    },
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::Print(_) => StatementKind::Print,
            Statement::Var { .. } => StatementKind::Var,
            Statement::Const { .. } => StatementKind::Const,
            Statement::Set { .. } => StatementKind::Set,
            Statement::Run(_) => StatementKind::Run,
            Statement::Return(_) => StatementKind::Return,
            Statement::Break => StatementKind::Break,
            Statement::Continue => StatementKind::Continue,
            Statement::While { .. } => StatementKind::While,
            Statement::For { .. } => StatementKind::For,
            Statement::If { .. } => StatementKind::If,
            Statement::Match { .. } => StatementKind::Match,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForRange {
    /// `for i in start..end`
    Bounds(Expr, Expr),
    /// `for x in collection`
    Each(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl AssignOp {
    pub fn from_token(token: &str) -> Result<Self, CompileError> {
        match token {
            "=" => Ok(AssignOp::Assign),
            "+=" => Ok(AssignOp::Add),
            "-=" => Ok(AssignOp::Sub),
            "*=" => Ok(AssignOp::Mul),
            "/=" => Ok(AssignOp::Div),
            "%=" => Ok(AssignOp::Rem),
            other => Err(CompileError::unknown("assignment operator", other)),
        }
    }

    pub fn as_rust(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
        }
    }
}

/// Lowered form of one statement.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementDecl {
    pub kind: StatementKind,
    pub emitted_code: String,
    /// Every execution path through this statement returns.
    pub returns: bool,
}

/// Lowered form of one function. Built once, never revisited.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub parameters: Vec<ParameterDecl>,
    pub return_type: Option<Value>,
    pub statements: Vec<StatementDecl>,
    /// Concatenation of the statements' code, in declaration order.
    pub emitted_code: String,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Identifier(String),
    Call {
        name: String,
        args: Vec<CallArg>,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: Method,
        mutating: bool,
        args: Vec<Expr>,
    },
    Field {
        base: Box<Expr>,
        field: String,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Flat operator chain, kept in source order.
    Infix {
        first: Box<Expr>,
        rest: Vec<(InfixOp, Expr)>,
    },
    Paren(Box<Expr>),
    /// Collection literal; element type comes from the surrounding context.
    Collection(Vec<Expr>),
}

impl Expr {
    /// Root identifier when this expression names storage rather than a
    /// temporary value.
    pub fn place_root(&self) -> Option<&str> {
        match self {
            Expr::Identifier(name) => Some(name),
            Expr::Field { base, .. } | Expr::Index { base, .. } => base.place_root(),
            Expr::Paren(inner) => inner.place_root(),
            _ => None,
        }
    }

    pub fn is_temporary(&self) -> bool {
        self.place_root().is_none()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub kind: LiteralKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    /// Untyped literal text, emitted exactly as given.
    Verbatim,
    Int,
    Float,
    Bool,
    Str,
    Char,
}

impl LiteralKind {
    pub fn from_tag(tag: &str) -> Result<Self, CompileError> {
        match tag {
            "int_literal" => Ok(LiteralKind::Int),
            "float_literal" => Ok(LiteralKind::Float),
            "bool_literal" => Ok(LiteralKind::Bool),
            "string_literal" => Ok(LiteralKind::Str),
            "char_literal" => Ok(LiteralKind::Char),
            other => Err(CompileError::unknown("literal kind", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallArg {
    pub accessor: Accessor,
    pub value: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Length,
    Append,
    Insert,
    Delete,
    Pop,
}

impl Method {
    pub fn from_name(name: &str) -> Result<Self, CompileError> {
        match name {
            "length" => Ok(Method::Length),
            "append" => Ok(Method::Append),
            "insert" => Ok(Method::Insert),
            "delete" => Ok(Method::Delete),
            "pop" => Ok(Method::Pop),
            other => Err(CompileError::unknown("method", other)),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Method::Length => "length",
            Method::Append => "append",
            Method::Insert => "insert",
            Method::Delete => "delete",
            Method::Pop => "pop",
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Method::Length | Method::Pop => 0,
            Method::Append | Method::Delete => 1,
            Method::Insert => 2,
        }
    }

    pub fn is_mutating(self) -> bool {
        !matches!(self, Method::Length)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn from_token(token: &str) -> Result<Self, CompileError> {
        match token {
            "-" => Ok(UnaryOp::Neg),
            "not" => Ok(UnaryOp::Not),
            other => Err(CompileError::unknown("unary operator", other)),
        }
    }

    pub fn as_rust(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl InfixOp {
    pub fn from_token(token: &str) -> Result<Self, CompileError> {
        match token {
            "+" => Ok(InfixOp::Add),
            "-" => Ok(InfixOp::Sub),
            "*" => Ok(InfixOp::Mul),
            "/" => Ok(InfixOp::Div),
            "%" => Ok(InfixOp::Rem),
            "==" => Ok(InfixOp::Eq),
            "!=" => Ok(InfixOp::Ne),
            "<" => Ok(InfixOp::Lt),
            "<=" => Ok(InfixOp::Le),
            ">" => Ok(InfixOp::Gt),
            ">=" => Ok(InfixOp::Ge),
            "and" => Ok(InfixOp::And),
            "or" => Ok(InfixOp::Or),
            other => Err(CompileError::unknown("infix operator", other)),
        }
    }

    pub fn as_rust(self) -> &'static str {
        match self {
            InfixOp::Add => "+",
            InfixOp::Sub => "-",
            InfixOp::Mul => "*",
            InfixOp::Div => "/",
            InfixOp::Rem => "%",
            InfixOp::Eq => "==",
            InfixOp::Ne => "!=",
            InfixOp::Lt => "<",
            InfixOp::Le => "<=",
            InfixOp::Gt => ">",
            InfixOp::Ge => ">=",
            InfixOp::And => "&&",
            InfixOp::Or => "||",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessor_defaults_to_look() {
        assert_eq!(Accessor::resolve(None).unwrap(), Accessor::Look);
        assert_eq!(Accessor::default(), Accessor::Look);
    }

    #[test]
    fn accessor_tokens() {
        assert_eq!(Accessor::from_token("mutate").unwrap(), Accessor::Mutate);
        assert_eq!(Accessor::from_token("move").unwrap(), Accessor::Move);
        assert_eq!(Accessor::from_token("copy").unwrap(), Accessor::Copy);
        for bad in ["look", "borrow", "Mutate", ""] {
            assert!(matches!(
                Accessor::from_token(bad),
                Err(CompileError::InvalidAccessor(_))
            ));
        }
    }

    #[test]
    fn statement_tags_round_trip_for_all_kinds() {
        for kind in StatementKind::ALL {
            assert_eq!(StatementKind::from_tag(kind.tag()).unwrap(), kind);
        }
        assert!(matches!(
            StatementKind::from_tag("exit_statement"),
            Err(CompileError::UnknownTag { .. })
        ));
    }

    #[test]
    fn place_root_follows_fields_and_indexes() {
        let expr = Expr::Index {
            base: Box::new(Expr::Field {
                base: Box::new(Expr::Identifier("grid".into())),
                field: "rows".into(),
            }),
            index: Box::new(Expr::Identifier("i".into())),
        };
        assert_eq!(expr.place_root(), Some("grid"));
        let call = Expr::Call {
            name: "make".into(),
            args: vec![],
        };
        assert!(call.is_temporary());
    }

    #[test]
    fn operators_map_word_forms() {
        assert_eq!(InfixOp::from_token("and").unwrap().as_rust(), "&&");
        assert_eq!(InfixOp::from_token("or").unwrap().as_rust(), "||");
        assert_eq!(UnaryOp::from_token("not").unwrap().as_rust(), "!");
        assert!(InfixOp::from_token("**").is_err());
    }
}
