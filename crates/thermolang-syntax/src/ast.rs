use crate::error::Span;
use std::fmt;

/// A parsed script: its rules in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub rules: Vec<Rule>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: Option<String>,
    pub trigger: Trigger,
    pub body: Block,
    pub span: Span,
}

impl Rule {
    /// `true` for a bare top-level statement wrapped as an always-true rule.
    pub fn is_implicit(&self) -> bool {
        matches!(self.trigger, Trigger::Always)
    }

    /// Name used in logs and fault reports: the declared name, or `#<index>`.
    pub fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("#{}", index),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Always,
    When(Expression),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Set {
        command: SetCommand,
        span: Span,
    },
    Wait {
        seconds: Expression,
        span: Span,
    },
    If {
        condition: Expression,
        then_block: Block,
        else_block: Option<Block>,
        span: Span,
    },
    While {
        condition: Expression,
        body: Block,
        span: Span,
    },
    Repeat {
        count: Expression,
        body: Block,
        span: Span,
    },
    Block(Block),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::Set { span, .. } => *span,
            Statement::Wait { span, .. } => *span,
            Statement::If { span, .. } => *span,
            Statement::While { span, .. } => *span,
            Statement::Repeat { span, .. } => *span,
            Statement::Block(block) => block.span,
        }
    }
}

/// One `SET` form. Enumerated targets carry their constant already
/// validated by the parser; `TEMP` and variables carry an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetCommand {
    Temp(Expression),
    Mode(Mode),
    Fan(FanSpeed),
    Swing(Swing),
    Power(Power),
    Variable { name: String, value: Expression },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Integer(i64, Span),
    Text(String, Span),
    Variable(String, Span),
    Sensor(Sensor, Span),
    Negate {
        expr: Box<Expression>,
        span: Span,
    },
    Binary {
        left: Box<Expression>,
        op: BinaryOp,
        right: Box<Expression>,
        span: Span,
    },
}

impl Expression {
    pub fn span(&self) -> &Span {
        match self {
            Expression::Integer(_, span) => span,
            Expression::Text(_, span) => span,
            Expression::Variable(_, span) => span,
            Expression::Sensor(_, span) => span,
            Expression::Negate { span, .. } => span,
            Expression::Binary { span, .. } => span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div)
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Mul | BinaryOp::Div => 4,
            BinaryOp::Add | BinaryOp::Sub => 3,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => 2,
            BinaryOp::Eq | BinaryOp::Ne => 1,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "EQ",
            BinaryOp::Ne => "NE",
            BinaryOp::Lt => "LT",
            BinaryOp::Le => "LE",
            BinaryOp::Gt => "GT",
            BinaryOp::Ge => "GE",
        };
        f.write_str(s)
    }
}

/// Reserved names that read the plant through the sensor facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensor {
    Humidity,
    Occupied,
    Time,
    /// Room temperature, spelled `TEMP` in expressions.
    Temperature,
}

impl Sensor {
    pub const ALL: [Sensor; 4] = [Sensor::Humidity, Sensor::Occupied, Sensor::Time, Sensor::Temperature];
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sensor::Humidity => "HUMIDITY",
            Sensor::Occupied => "OCCUPIED",
            Sensor::Time => "TIME",
            Sensor::Temperature => "TEMP",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Cool,
    Heat,
    Dry,
    Fan,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanSpeed {
    #[default]
    Off,
    Low,
    Mid,
    High,
    Auto,
}

impl FanSpeed {
    /// Speed step used by the thermal model: OFF=0 .. HIGH=3, AUTO runs at MID.
    pub fn level(self) -> i64 {
        match self {
            FanSpeed::Off => 0,
            FanSpeed::Low => 1,
            FanSpeed::Mid | FanSpeed::Auto => 2,
            FanSpeed::High => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Swing {
    #[default]
    Off,
    On,
    Low,
    Mid,
    High,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Power {
    On,
    #[default]
    Off,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Cool => "COOL",
            Mode::Heat => "HEAT",
            Mode::Dry => "DRY",
            Mode::Fan => "FAN",
            Mode::Auto => "AUTO",
        })
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FanSpeed::Off => "OFF",
            FanSpeed::Low => "LOW",
            FanSpeed::Mid => "MID",
            FanSpeed::High => "HIGH",
            FanSpeed::Auto => "AUTO",
        })
    }
}

impl fmt::Display for Swing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Swing::Off => "OFF",
            Swing::On => "ON",
            Swing::Low => "LOW",
            Swing::Mid => "MID",
            Swing::High => "HIGH",
            Swing::Auto => "AUTO",
        })
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Power::On => "ON",
            Power::Off => "OFF",
        })
    }
}
