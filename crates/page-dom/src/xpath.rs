//! XPath 1.0 subset evaluated over the element arena.
//!
//! Covers what SITEINFO definitions use in practice: absolute and relative
//! location paths, `//`, `*`, `.`/`..`, the child/descendant/ancestor/sibling
//! and following/preceding axes, positional predicates, filtered node-sets
//! such as `(//a)[last()]`, attribute and text tests, string functions
//! (`contains`, `starts-with`, `normalize-space`, `translate`, `string`,
//! `string-length`, `concat`, `substring`, `substring-before`,
//! `substring-after`, `not`, `position`, `last`, `count`), arithmetic, boolean
//! `and`/`or`, comparisons and `|` unions. Only elements are ever selected.

use crate::html::DomTree;

/// Evaluate `expression` against `tree`, returning element indices in
/// document order without duplicates.
pub(crate) fn evaluate(
    tree: &DomTree,
    expression: &str,
    live: &dyn Fn(usize) -> bool,
) -> Result<Vec<usize>, String> {
    let tokens = lex(expression)?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_or()?;
    if parser.pos != parser.tokens.len() {
        return Err(format!("unexpected token {:?}", parser.tokens[parser.pos]));
    }
    let eval = Evaluator { tree, live };
    match eval.eval(&expr, None, 1, 1)? {
        Value::Nodes(mut nodes) => {
            nodes.sort_unstable();
            nodes.dedup();
            Ok(nodes)
        }
        _ => Err("expression does not select elements".into()),
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Tok {
    Slash,
    DoubleSlash,
    LBracket,
    RBracket,
    LParen,
    RParen,
    At,
    Comma,
    Pipe,
    Plus,
    Minus,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Dot,
    DotDot,
    ColonColon,
    Star,
    Name(String),
    Str(String),
    Num(f64),
}

fn lex(input: &str) -> Result<Vec<Tok>, String> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match c {
            c if c.is_whitespace() => i += 1,
            '/' if next == Some('/') => {
                tokens.push(Tok::DoubleSlash);
                i += 2;
            }
            '/' => {
                tokens.push(Tok::Slash);
                i += 1;
            }
            '[' | ']' | '(' | ')' | '@' | ',' | '|' | '+' | '-' | '=' | '*' => {
                tokens.push(match c {
                    '[' => Tok::LBracket,
                    ']' => Tok::RBracket,
                    '(' => Tok::LParen,
                    ')' => Tok::RParen,
                    '@' => Tok::At,
                    ',' => Tok::Comma,
                    '|' => Tok::Pipe,
                    '+' => Tok::Plus,
                    '-' => Tok::Minus,
                    '=' => Tok::Eq,
                    _ => Tok::Star,
                });
                i += 1;
            }
            '!' if next == Some('=') => {
                tokens.push(Tok::NotEq);
                i += 2;
            }
            '<' | '>' => {
                let with_eq = next == Some('=');
                tokens.push(match (c, with_eq) {
                    ('<', true) => Tok::Le,
                    ('<', false) => Tok::Lt,
                    (_, true) => Tok::Ge,
                    _ => Tok::Gt,
                });
                i += if with_eq { 2 } else { 1 };
            }
            ':' if next == Some(':') => {
                tokens.push(Tok::ColonColon);
                i += 2;
            }
            '.' if next == Some('.') => {
                tokens.push(Tok::DotDot);
                i += 2;
            }
            '.' if !next.is_some_and(|n| n.is_ascii_digit()) => {
                tokens.push(Tok::Dot);
                i += 1;
            }
            '\'' | '"' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|ch| *ch == c)
                    .ok_or_else(|| "unterminated string literal".to_string())?;
                tokens.push(Tok::Str(chars[i + 1..i + 1 + end].iter().collect()));
                i += end + 2;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let raw: String = chars[start..i].iter().collect();
                let number = raw
                    .parse::<f64>()
                    .map_err(|_| format!("invalid number '{raw}'"))?;
                tokens.push(Tok::Num(number));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '-' || chars[i] == '_')
                {
                    i += 1;
                }
                tokens.push(Tok::Name(chars[start..i].iter().collect()));
            }
            other => return Err(format!("unexpected character '{other}'")),
        }
    }
    Ok(tokens)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    SelfNode,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
}

impl Axis {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "child" => Axis::Child,
            "descendant" => Axis::Descendant,
            "descendant-or-self" => Axis::DescendantOrSelf,
            "self" => Axis::SelfNode,
            "parent" => Axis::Parent,
            "ancestor" => Axis::Ancestor,
            "ancestor-or-self" => Axis::AncestorOrSelf,
            "following-sibling" => Axis::FollowingSibling,
            "preceding-sibling" => Axis::PrecedingSibling,
            "following" => Axis::Following,
            "preceding" => Axis::Preceding,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
enum NodeTest {
    /// `node()`: anything, including the document root.
    Node,
    /// `*`: any element.
    Element,
    Name(String),
}

#[derive(Clone, Debug)]
struct Step {
    axis: Axis,
    test: NodeTest,
    predicates: Vec<Expr>,
}

#[derive(Clone, Debug)]
struct LocationPath {
    absolute: bool,
    steps: Vec<Step>,
}

#[derive(Clone, Copy, Debug)]
enum CmpOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Clone, Copy, Debug)]
enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Clone, Debug)]
enum Expr {
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
    Arith(ArithOp, Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Union(Vec<Expr>),
    /// A primary expression narrowed by predicates, then walked by steps.
    Filter {
        base: Box<Expr>,
        predicates: Vec<Expr>,
        steps: Vec<Step>,
    },
    Literal(String),
    Number(f64),
    Attr(Option<String>),
    Text,
    Call(String, Vec<Expr>),
    Path(LocationPath),
}

struct Parser {
    tokens: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Tok> {
        self.tokens.get(self.pos + offset)
    }

    fn bump(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: Tok) -> Result<(), String> {
        match self.bump() {
            Some(tok) if tok == expected => Ok(()),
            Some(tok) => Err(format!("expected {expected:?}, found {tok:?}")),
            None => Err(format!("expected {expected:?}, found end of expression")),
        }
    }

    fn starts_step(&self) -> bool {
        matches!(
            self.peek(),
            Some(Tok::Dot | Tok::DotDot | Tok::Star | Tok::Name(_) | Tok::At)
        )
    }

    fn parse_path(&mut self) -> Result<LocationPath, String> {
        let mut path = LocationPath {
            absolute: false,
            steps: Vec::new(),
        };
        match self.peek() {
            Some(Tok::Slash) => {
                self.bump();
                path.absolute = true;
                if !self.starts_step() {
                    return Ok(path);
                }
            }
            Some(Tok::DoubleSlash) => {
                self.bump();
                path.absolute = true;
                path.steps.push(descendant_or_self());
            }
            _ => {}
        }
        path.steps.push(self.parse_step()?);
        self.parse_trailing_steps(&mut path.steps)?;
        Ok(path)
    }

    /// `/step` and `//step` continuations after a first step or a filter.
    fn parse_trailing_steps(&mut self, steps: &mut Vec<Step>) -> Result<(), String> {
        loop {
            match self.peek() {
                Some(Tok::Slash) => {
                    self.bump();
                }
                Some(Tok::DoubleSlash) => {
                    self.bump();
                    steps.push(descendant_or_self());
                }
                _ => return Ok(()),
            }
            steps.push(self.parse_step()?);
        }
    }

    fn parse_predicates(&mut self) -> Result<Vec<Expr>, String> {
        let mut predicates = Vec::new();
        while self.peek() == Some(&Tok::LBracket) {
            self.bump();
            predicates.push(self.parse_or()?);
            self.expect(Tok::RBracket)?;
        }
        Ok(predicates)
    }

    fn parse_step(&mut self) -> Result<Step, String> {
        match self.peek() {
            Some(Tok::Dot) => {
                self.bump();
                return Ok(bare_step(Axis::SelfNode, NodeTest::Node));
            }
            Some(Tok::DotDot) => {
                self.bump();
                return Ok(bare_step(Axis::Parent, NodeTest::Node));
            }
            Some(Tok::At) => return Err("attribute nodes cannot be selected".into()),
            _ => {}
        }

        let mut axis = Axis::Child;
        if let (Some(Tok::Name(name)), Some(Tok::ColonColon)) = (self.peek(), self.peek_at(1)) {
            axis = Axis::from_name(name).ok_or_else(|| format!("unsupported axis '{name}'"))?;
            self.bump();
            self.bump();
        }

        let test = match self.bump() {
            Some(Tok::Star) => NodeTest::Element,
            Some(Tok::Name(name)) if self.peek() == Some(&Tok::LParen) => {
                self.bump();
                self.expect(Tok::RParen)?;
                match name.as_str() {
                    "node" => NodeTest::Node,
                    other => return Err(format!("cannot select {other}() nodes")),
                }
            }
            Some(Tok::Name(name)) => NodeTest::Name(name.to_ascii_lowercase()),
            Some(tok) => return Err(format!("expected node test, found {tok:?}")),
            None => return Err("expected node test, found end of expression".into()),
        };

        Ok(Step {
            axis,
            test,
            predicates: self.parse_predicates()?,
        })
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Some(Tok::Name(name)) if name == "or") {
            self.bump();
            left = Expr::Or(Box::new(left), Box::new(self.parse_and()?));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_cmp()?;
        while matches!(self.peek(), Some(Tok::Name(name)) if name == "and") {
            self.bump();
            left = Expr::And(Box::new(left), Box::new(self.parse_cmp()?));
        }
        Ok(left)
    }

    fn parse_cmp(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Eq) => CmpOp::Eq,
                Some(Tok::NotEq) => CmpOp::NotEq,
                Some(Tok::Lt) => CmpOp::Lt,
                Some(Tok::Le) => CmpOp::Le,
                Some(Tok::Gt) => CmpOp::Gt,
                Some(Tok::Ge) => CmpOp::Ge,
                _ => return Ok(left),
            };
            self.bump();
            let right = self.parse_additive()?;
            left = Expr::Cmp(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Plus) => ArithOp::Add,
                Some(Tok::Minus) => ArithOp::Sub,
                _ => return Ok(left),
            };
            self.bump();
            let right = self.parse_multiplicative()?;
            left = Expr::Arith(op, Box::new(left), Box::new(right));
        }
    }

    /// `*` here is multiplication: a node test `*` is always consumed by a step.
    fn parse_multiplicative(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Tok::Star) => ArithOp::Mul,
                Some(Tok::Name(name)) if name == "div" => ArithOp::Div,
                Some(Tok::Name(name)) if name == "mod" => ArithOp::Mod,
                _ => return Ok(left),
            };
            self.bump();
            let right = self.parse_unary()?;
            left = Expr::Arith(op, Box::new(left), Box::new(right));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        if self.peek() == Some(&Tok::Minus) {
            self.bump();
            return Ok(Expr::Neg(Box::new(self.parse_unary()?)));
        }
        self.parse_union()
    }

    fn parse_union(&mut self) -> Result<Expr, String> {
        let first = self.parse_path_expr()?;
        if self.peek() != Some(&Tok::Pipe) {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.peek() == Some(&Tok::Pipe) {
            self.bump();
            members.push(self.parse_path_expr()?);
        }
        Ok(Expr::Union(members))
    }

    fn starts_primary(&self) -> bool {
        match self.peek() {
            Some(Tok::LParen | Tok::Str(_) | Tok::Num(_) | Tok::At) => true,
            Some(Tok::Name(name)) => self.peek_at(1) == Some(&Tok::LParen) && name != "node",
            _ => false,
        }
    }

    fn parse_path_expr(&mut self) -> Result<Expr, String> {
        if !self.starts_primary() {
            return Ok(Expr::Path(self.parse_path()?));
        }
        let base = self.parse_primary()?;
        let predicates = self.parse_predicates()?;
        let mut steps = Vec::new();
        self.parse_trailing_steps(&mut steps)?;
        if predicates.is_empty() && steps.is_empty() {
            return Ok(base);
        }
        Ok(Expr::Filter {
            base: Box::new(base),
            predicates,
            steps,
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.peek().cloned() {
            Some(Tok::LParen) => {
                self.bump();
                let inner = self.parse_or()?;
                self.expect(Tok::RParen)?;
                Ok(inner)
            }
            Some(Tok::Str(value)) => {
                self.bump();
                Ok(Expr::Literal(value))
            }
            Some(Tok::Num(value)) => {
                self.bump();
                Ok(Expr::Number(value))
            }
            Some(Tok::At) => {
                self.bump();
                match self.bump() {
                    Some(Tok::Name(name)) => Ok(Expr::Attr(Some(name.to_ascii_lowercase()))),
                    Some(Tok::Star) => Ok(Expr::Attr(None)),
                    other => Err(format!("expected attribute name, found {other:?}")),
                }
            }
            Some(Tok::Name(name))
                if self.peek_at(1) == Some(&Tok::LParen) && name != "node" =>
            {
                self.bump();
                self.bump();
                let mut args = Vec::new();
                if self.peek() != Some(&Tok::RParen) {
                    args.push(self.parse_or()?);
                    while self.peek() == Some(&Tok::Comma) {
                        self.bump();
                        args.push(self.parse_or()?);
                    }
                }
                self.expect(Tok::RParen)?;
                if name == "text" {
                    if !args.is_empty() {
                        return Err("text() takes no arguments".into());
                    }
                    return Ok(Expr::Text);
                }
                Ok(Expr::Call(name, args))
            }
            Some(tok) => Err(format!("unexpected token {tok:?}")),
            None => Err("unexpected end of expression".into()),
        }
    }
}

fn bare_step(axis: Axis, test: NodeTest) -> Step {
    Step {
        axis,
        test,
        predicates: Vec::new(),
    }
}

fn descendant_or_self() -> Step {
    bare_step(Axis::DescendantOrSelf, NodeTest::Node)
}

fn round_half_up(n: f64) -> f64 {
    (n + 0.5).floor()
}

#[derive(Clone, Debug)]
enum Value {
    Nodes(Vec<usize>),
    Strings(Vec<String>),
    Str(String),
    Num(f64),
    Bool(bool),
}

/// Context node; `None` is the document root.
type Ctx = Option<usize>;

struct Evaluator<'a> {
    tree: &'a DomTree,
    live: &'a dyn Fn(usize) -> bool,
}

impl<'a> Evaluator<'a> {
    fn select(&self, path: &LocationPath, origin: Ctx) -> Result<Vec<Ctx>, String> {
        let start = if path.absolute { None } else { origin };
        self.walk(&path.steps, vec![start])
    }

    fn walk(&self, steps: &[Step], mut current: Vec<Ctx>) -> Result<Vec<Ctx>, String> {
        for step in steps {
            let mut next = Vec::new();
            for ctx in &current {
                let mut candidates: Vec<Ctx> = self
                    .axis(step.axis, *ctx)
                    .into_iter()
                    .filter(|candidate| self.test(&step.test, *candidate))
                    .collect();
                for predicate in &step.predicates {
                    candidates = self.filter(candidates, predicate)?;
                }
                next.extend(candidates);
            }
            next.sort_unstable();
            next.dedup();
            current = next;
        }
        Ok(current)
    }

    fn filter(&self, candidates: Vec<Ctx>, predicate: &Expr) -> Result<Vec<Ctx>, String> {
        let size = candidates.len();
        let mut kept = Vec::new();
        for (offset, candidate) in candidates.into_iter().enumerate() {
            let position = offset + 1;
            let keep = match self.eval(predicate, candidate, position, size)? {
                Value::Num(n) => n == position as f64,
                other => self.truthy(&other),
            };
            if keep {
                kept.push(candidate);
            }
        }
        Ok(kept)
    }

    fn children(&self, ctx: Ctx) -> Vec<usize> {
        let raw: Vec<usize> = match ctx {
            None => self.tree.roots.clone(),
            Some(idx) => self.tree.element_children(idx).collect(),
        };
        raw.into_iter().filter(|idx| (self.live)(*idx)).collect()
    }

    fn descendants(&self, ctx: Ctx, out: &mut Vec<Ctx>) {
        for child in self.children(ctx) {
            out.push(Some(child));
            self.descendants(Some(child), out);
        }
    }

    fn parent(&self, ctx: Ctx) -> Option<Ctx> {
        ctx.map(|idx| self.tree.nodes[idx].parent)
    }

    /// Element with its live subtree, in document order.
    fn subtree(&self, idx: usize, out: &mut Vec<Ctx>) {
        out.push(Some(idx));
        self.descendants(Some(idx), out);
    }

    fn siblings(&self, ctx: Ctx) -> (Vec<usize>, Option<usize>) {
        match ctx {
            None => (Vec::new(), None),
            Some(idx) => {
                let all = self.children(self.tree.nodes[idx].parent);
                let position = all.iter().position(|sibling| *sibling == idx);
                (all, position)
            }
        }
    }

    /// Candidates in axis order (reverse axes list nearest first).
    fn axis(&self, axis: Axis, ctx: Ctx) -> Vec<Ctx> {
        match axis {
            Axis::Child => self.children(ctx).into_iter().map(Some).collect(),
            Axis::Descendant => {
                let mut out = Vec::new();
                self.descendants(ctx, &mut out);
                out
            }
            Axis::DescendantOrSelf => {
                let mut out = vec![ctx];
                self.descendants(ctx, &mut out);
                out
            }
            Axis::SelfNode => vec![ctx],
            Axis::Parent => self.parent(ctx).into_iter().collect(),
            Axis::Ancestor | Axis::AncestorOrSelf => {
                let mut out = Vec::new();
                if axis == Axis::AncestorOrSelf {
                    out.push(ctx);
                }
                let mut cursor = self.parent(ctx);
                while let Some(current) = cursor {
                    out.push(current);
                    cursor = self.parent(current);
                }
                out
            }
            Axis::FollowingSibling => {
                let (all, position) = self.siblings(ctx);
                match position {
                    Some(pos) => all[pos + 1..].iter().copied().map(Some).collect(),
                    None => Vec::new(),
                }
            }
            Axis::PrecedingSibling => {
                let (all, position) = self.siblings(ctx);
                match position {
                    Some(pos) => all[..pos].iter().rev().copied().map(Some).collect(),
                    None => Vec::new(),
                }
            }
            Axis::Following => {
                let mut out = Vec::new();
                let mut cursor = ctx;
                while cursor.is_some() {
                    let (all, position) = self.siblings(cursor);
                    if let Some(pos) = position {
                        for sibling in &all[pos + 1..] {
                            self.subtree(*sibling, &mut out);
                        }
                    }
                    cursor = self.parent(cursor).flatten();
                }
                out
            }
            Axis::Preceding => {
                let mut out = Vec::new();
                let mut cursor = ctx;
                while cursor.is_some() {
                    let (all, position) = self.siblings(cursor);
                    if let Some(pos) = position {
                        for sibling in all[..pos].iter().rev() {
                            let mut tree = Vec::new();
                            self.subtree(*sibling, &mut tree);
                            out.extend(tree.into_iter().rev());
                        }
                    }
                    cursor = self.parent(cursor).flatten();
                }
                out
            }
        }
    }

    fn test(&self, test: &NodeTest, ctx: Ctx) -> bool {
        match (test, ctx) {
            (NodeTest::Node, _) => true,
            (_, None) => false,
            (NodeTest::Element, Some(_)) => true,
            (NodeTest::Name(name), Some(idx)) => self.tree.nodes[idx].tag == *name,
        }
    }

    fn eval(&self, expr: &Expr, ctx: Ctx, position: usize, size: usize) -> Result<Value, String> {
        Ok(match expr {
            Expr::Or(left, right) => Value::Bool(
                self.truthy(&self.eval(left, ctx, position, size)?)
                    || self.truthy(&self.eval(right, ctx, position, size)?),
            ),
            Expr::And(left, right) => Value::Bool(
                self.truthy(&self.eval(left, ctx, position, size)?)
                    && self.truthy(&self.eval(right, ctx, position, size)?),
            ),
            Expr::Cmp(op, left, right) => {
                let left = self.eval(left, ctx, position, size)?;
                let right = self.eval(right, ctx, position, size)?;
                Value::Bool(self.compare(*op, &left, &right))
            }
            Expr::Literal(value) => Value::Str(value.clone()),
            Expr::Number(value) => Value::Num(*value),
            Expr::Attr(name) => Value::Strings(match ctx {
                None => Vec::new(),
                Some(idx) => self.tree.nodes[idx]
                    .attrs
                    .iter()
                    .filter(|(key, _)| name.as_ref().map_or(true, |wanted| key == wanted))
                    .map(|(_, value)| value.clone())
                    .collect(),
            }),
            Expr::Text => Value::Strings(match ctx {
                None => Vec::new(),
                Some(idx) => self.tree.own_text(idx),
            }),
            Expr::Path(path) => Value::Nodes(
                self.select(path, ctx)?
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>(),
            ),
            Expr::Arith(op, left, right) => {
                let left = self.number(&self.eval(left, ctx, position, size)?);
                let right = self.number(&self.eval(right, ctx, position, size)?);
                Value::Num(match op {
                    ArithOp::Add => left + right,
                    ArithOp::Sub => left - right,
                    ArithOp::Mul => left * right,
                    ArithOp::Div => left / right,
                    ArithOp::Mod => left % right,
                })
            }
            Expr::Neg(inner) => Value::Num(-self.number(&self.eval(inner, ctx, position, size)?)),
            Expr::Union(members) => {
                let mut nodes = Vec::new();
                for member in members {
                    match self.eval(member, ctx, position, size)? {
                        Value::Nodes(found) => nodes.extend(found),
                        _ => return Err("union operands must be node-sets".into()),
                    }
                }
                nodes.sort_unstable();
                nodes.dedup();
                Value::Nodes(nodes)
            }
            Expr::Filter {
                base,
                predicates,
                steps,
            } => {
                let mut nodes: Vec<Ctx> = match self.eval(base, ctx, position, size)? {
                    Value::Nodes(found) => found.into_iter().map(Some).collect(),
                    _ => return Err("predicates and steps apply to node-sets only".into()),
                };
                // Positions count over the whole set in document order.
                for predicate in predicates {
                    nodes = self.filter(nodes, predicate)?;
                }
                Value::Nodes(self.walk(steps, nodes)?.into_iter().flatten().collect())
            }
            Expr::Call(name, args) => self.call(name, args, ctx, position, size)?,
        })
    }

    fn call(
        &self,
        name: &str,
        args: &[Expr],
        ctx: Ctx,
        position: usize,
        size: usize,
    ) -> Result<Value, String> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg, ctx, position, size)?);
        }
        let arity = |expected: usize| {
            if values.len() == expected {
                Ok(())
            } else {
                Err(format!("{name}() expects {expected} argument(s)"))
            }
        };
        let context_string = || match ctx {
            Some(idx) => self.tree.text_content(idx),
            None => String::new(),
        };
        Ok(match name {
            "last" => {
                arity(0)?;
                Value::Num(size as f64)
            }
            "position" => {
                arity(0)?;
                Value::Num(position as f64)
            }
            "count" => {
                arity(1)?;
                Value::Num(match &values[0] {
                    Value::Nodes(nodes) => nodes.len() as f64,
                    Value::Strings(items) => items.len() as f64,
                    _ => return Err("count() expects a node-set".into()),
                })
            }
            "not" => {
                arity(1)?;
                Value::Bool(!self.truthy(&values[0]))
            }
            "contains" => {
                arity(2)?;
                Value::Bool(self.string(&values[0]).contains(&self.string(&values[1])))
            }
            "starts-with" => {
                arity(2)?;
                Value::Bool(self.string(&values[0]).starts_with(&self.string(&values[1])))
            }
            "string" => match values.len() {
                0 => Value::Str(context_string()),
                1 => Value::Str(self.string(&values[0])),
                _ => return Err("string() expects at most 1 argument".into()),
            },
            "string-length" => {
                let text = match values.len() {
                    0 => context_string(),
                    1 => self.string(&values[0]),
                    _ => return Err("string-length() expects at most 1 argument".into()),
                };
                Value::Num(text.chars().count() as f64)
            }
            "normalize-space" => {
                let text = match values.len() {
                    0 => context_string(),
                    1 => self.string(&values[0]),
                    _ => return Err("normalize-space() expects at most 1 argument".into()),
                };
                Value::Str(text.split_whitespace().collect::<Vec<_>>().join(" "))
            }
            "concat" => {
                if values.len() < 2 {
                    return Err("concat() expects at least 2 arguments".into());
                }
                Value::Str(values.iter().map(|value| self.string(value)).collect())
            }
            "translate" => {
                arity(3)?;
                let from: Vec<char> = self.string(&values[1]).chars().collect();
                let to: Vec<char> = self.string(&values[2]).chars().collect();
                Value::Str(
                    self.string(&values[0])
                        .chars()
                        .filter_map(|c| match from.iter().position(|f| *f == c) {
                            Some(i) => to.get(i).copied(),
                            None => Some(c),
                        })
                        .collect(),
                )
            }
            "substring" => {
                if !(2..=3).contains(&values.len()) {
                    return Err("substring() expects 2 or 3 arguments".into());
                }
                // 1-based positions, rounded half up; NaN bounds select nothing.
                let start = round_half_up(self.number(&values[1]));
                let end = values
                    .get(2)
                    .map(|len| start + round_half_up(self.number(len)));
                Value::Str(
                    self.string(&values[0])
                        .chars()
                        .enumerate()
                        .filter(|(offset, _)| {
                            let at = (offset + 1) as f64;
                            at >= start && end.map_or(true, |end| at < end)
                        })
                        .map(|(_, c)| c)
                        .collect(),
                )
            }
            "substring-before" => {
                arity(2)?;
                let text = self.string(&values[0]);
                let needle = self.string(&values[1]);
                Value::Str(match text.find(&needle) {
                    Some(at) => text[..at].to_string(),
                    None => String::new(),
                })
            }
            "substring-after" => {
                arity(2)?;
                let text = self.string(&values[0]);
                let needle = self.string(&values[1]);
                Value::Str(match text.find(&needle) {
                    Some(at) => text[at + needle.len()..].to_string(),
                    None => String::new(),
                })
            }
            "true" => {
                arity(0)?;
                Value::Bool(true)
            }
            "false" => {
                arity(0)?;
                Value::Bool(false)
            }
            other => return Err(format!("unsupported function {other}()")),
        })
    }

    fn strings(&self, value: &Value) -> Option<Vec<String>> {
        match value {
            Value::Nodes(nodes) => Some(
                nodes
                    .iter()
                    .map(|idx| self.tree.text_content(*idx))
                    .collect(),
            ),
            Value::Strings(items) => Some(items.clone()),
            _ => None,
        }
    }

    fn string(&self, value: &Value) -> String {
        match value {
            Value::Nodes(_) | Value::Strings(_) => self
                .strings(value)
                .and_then(|items| items.into_iter().next())
                .unwrap_or_default(),
            Value::Str(text) => text.clone(),
            Value::Num(n) if n.fract() == 0.0 && n.is_finite() => format!("{}", *n as i64),
            Value::Num(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
        }
    }

    fn number(&self, value: &Value) -> f64 {
        match value {
            Value::Num(n) => *n,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            other => self.string(other).trim().parse().unwrap_or(f64::NAN),
        }
    }

    fn truthy(&self, value: &Value) -> bool {
        match value {
            Value::Nodes(nodes) => !nodes.is_empty(),
            Value::Strings(items) => !items.is_empty(),
            Value::Str(text) => !text.is_empty(),
            Value::Num(n) => *n != 0.0 && !n.is_nan(),
            Value::Bool(b) => *b,
        }
    }

    fn compare(&self, op: CmpOp, left: &Value, right: &Value) -> bool {
        // Node-set comparisons hold when any member satisfies the relation.
        if let Some(items) = self.strings(left) {
            return items
                .into_iter()
                .any(|item| self.compare(op, &Value::Str(item), right));
        }
        if let Some(items) = self.strings(right) {
            return items
                .into_iter()
                .any(|item| self.compare(op, left, &Value::Str(item)));
        }
        match op {
            CmpOp::Eq | CmpOp::NotEq => {
                let equal = match (left, right) {
                    (Value::Bool(_), _) | (_, Value::Bool(_)) => {
                        self.truthy(left) == self.truthy(right)
                    }
                    (Value::Num(_), _) | (_, Value::Num(_)) => {
                        self.number(left) == self.number(right)
                    }
                    _ => self.string(left) == self.string(right),
                };
                matches!(op, CmpOp::Eq) == equal
            }
            CmpOp::Lt => self.number(left) < self.number(right),
            CmpOp::Le => self.number(left) <= self.number(right),
            CmpOp::Gt => self.number(left) > self.number(right),
            CmpOp::Ge => self.number(left) >= self.number(right),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::html::HtmlPage;
    use crate::ports::PageQuery;

    const PAGE: &str = r#"<html><body>
<ul id="menu">
  <li class="item"><a href="/a">Alpha</a></li>
  <li class="item active"><a href="/b">Beta</a></li>
  <li class="item"><a href="/c" title="third">Gamma  ray</a></li>
</ul>
<div id="footer"><button type="submit">Send</button><button>Reset</button></div>
</body></html>"#;

    fn ids(page: &HtmlPage, expression: &str) -> Vec<String> {
        page.evaluate_xpath(expression)
            .unwrap()
            .iter()
            .map(|el| page.describe(el).unwrap())
            .collect()
    }

    fn texts(page: &HtmlPage, expression: &str) -> Vec<String> {
        page.evaluate_xpath(expression)
            .unwrap()
            .iter()
            .map(|el| page.element_text(el).unwrap().text_content)
            .collect()
    }

    #[test]
    fn descendant_and_positional_steps() {
        let page = HtmlPage::parse("https://x/", PAGE);
        assert_eq!(ids(&page, "//li[2]/a"), vec!["a"]);
        assert_eq!(page.evaluate_xpath("//li").unwrap().len(), 3);
        assert_eq!(ids(&page, "//ul/li[last()]"), vec!["li.item"]);
        assert_eq!(page.evaluate_xpath("/html/body/ul/li/a").unwrap().len(), 3);
    }

    #[test]
    fn attribute_and_text_predicates() {
        let page = HtmlPage::parse("https://x/", PAGE);
        assert_eq!(
            ids(&page, "//li[contains(@class, 'active')]"),
            vec!["li.item.active"]
        );
        assert_eq!(ids(&page, "//button[@type='submit']"), vec!["button"]);
        assert_eq!(ids(&page, "//button[text()='Reset']"), vec!["button"]);
        assert_eq!(page.evaluate_xpath("//a[@title]").unwrap().len(), 1);
        assert_eq!(
            page.evaluate_xpath("//a[normalize-space(.)='Gamma ray']")
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            page.evaluate_xpath("//a[starts-with(@href, '/b') or @title='third']")
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn unions_come_back_in_document_order() {
        let page = HtmlPage::parse("https://x/", PAGE);
        let found = ids(&page, "//div[@id='footer'] | //ul[@id='menu']");
        assert_eq!(found, vec!["ul#menu", "div#footer"]);
    }

    #[test]
    fn parent_and_sibling_axes() {
        let page = HtmlPage::parse("https://x/", PAGE);
        assert_eq!(ids(&page, "//a[text()='Beta']/.."), vec!["li.item.active"]);
        assert_eq!(
            ids(&page, "//button[text()='Send']/following-sibling::button"),
            vec!["button"]
        );
        assert_eq!(
            page.evaluate_xpath("//li[.//a[@href='/c']]/preceding-sibling::li")
                .unwrap()
                .len(),
            2
        );
    }

    #[test]
    fn filtered_node_sets_count_positions_across_the_document() {
        let page = HtmlPage::parse("https://x/", PAGE);
        assert_eq!(texts(&page, "(//a)[1]"), vec!["Alpha"]);
        assert_eq!(texts(&page, "(//a)[last()]"), vec!["Gamma  ray"]);
        assert_eq!(page.evaluate_xpath("//li/a[1]").unwrap().len(), 3);
        assert_eq!(texts(&page, "(//li)[2]/a"), vec!["Beta"]);
        assert_eq!(texts(&page, "(//button | //a)[last()]"), vec!["Reset"]);
        assert_eq!(ids(&page, "(//a)[1] | //button[2]"), vec!["a", "button"]);
    }

    #[test]
    fn arithmetic_in_predicates() {
        let page = HtmlPage::parse("https://x/", PAGE);
        assert_eq!(texts(&page, "//li[last()-1]/a"), vec!["Beta"]);
        assert_eq!(texts(&page, "//li[last() - 1]/a"), vec!["Beta"]);
        assert_eq!(texts(&page, "//li[position() = 1 + 1]/a"), vec!["Beta"]);
        assert_eq!(
            texts(&page, "//li[position() mod 2 = 1]/a"),
            vec!["Alpha", "Gamma  ray"]
        );
        assert_eq!(texts(&page, "//li[position() = count(//li) - 2]/a"), vec!["Alpha"]);
        assert_eq!(texts(&page, "(//a)[-1 + 2]"), vec!["Alpha"]);
        assert_eq!(texts(&page, "//li[position() * 2 = 6 div 1]/a"), vec!["Gamma  ray"]);
    }

    #[test]
    fn following_and_preceding_skip_subtree_and_ancestors() {
        let page = HtmlPage::parse("https://x/", PAGE);
        assert_eq!(texts(&page, "//li[2]/following::a"), vec!["Gamma  ray"]);
        assert_eq!(
            ids(&page, "//ul/following::*"),
            vec!["div#footer", "button", "button"]
        );
        assert_eq!(texts(&page, "//a[text()='Beta']/preceding::a"), vec!["Alpha"]);
        assert_eq!(texts(&page, "//a[text()='Beta']/preceding::li"), vec!["Alpha"]);
        // Reverse axis: the nearest preceding element is position 1.
        assert_eq!(texts(&page, "//button[1]/preceding::a[1]"), vec!["Gamma  ray"]);
        assert_eq!(texts(&page, "//li[3]/preceding::li[1]"), vec!["Beta"]);
    }

    #[test]
    fn substring_functions() {
        let page = HtmlPage::parse("https://x/", PAGE);
        assert_eq!(texts(&page, "//a[substring(., 1, 1) = 'B']"), vec!["Beta"]);
        assert_eq!(texts(&page, "//a[substring(@href, 2) = 'c']"), vec!["Gamma  ray"]);
        assert_eq!(texts(&page, "//a[substring(., 1.5, 2.6) = 'lph']"), vec!["Alpha"]);
        assert_eq!(
            page.evaluate_xpath("//a[substring(., 0 div 0) = '']")
                .unwrap()
                .len(),
            3
        );
        assert_eq!(
            texts(&page, "//a[substring-before(., ' ') = 'Gamma']"),
            vec!["Gamma  ray"]
        );
        assert_eq!(texts(&page, "//a[substring-after(@href, '/') = 'a']"), vec!["Alpha"]);

        let accented = HtmlPage::parse("https://x/", "<a>élan</a><a>exit</a>");
        assert_eq!(texts(&accented, "//a[substring(., 1, 1)='é']"), vec!["élan"]);
    }

    #[test]
    fn case_insensitive_match_through_translate() {
        let page = HtmlPage::parse("https://x/", PAGE);
        let found = page
            .evaluate_xpath(
                "//button[contains(translate(., 'ABCDEFGHIJKLMNOPQRSTUVWXYZ', 'abcdefghijklmnopqrstuvwxyz'), 'send')]",
            )
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        let page = HtmlPage::parse("https://x/", PAGE);
        for bad in [
            "//li[",
            "//li[@]",
            "//a[foo(1)]",
            "//'open",
            "//text()",
            "]",
            "(//a",
            "1 + 1",
            "//a[substring(.)]",
            "//li/nearby::a",
        ] {
            assert!(page.evaluate_xpath(bad).is_err(), "{bad} should fail");
        }
    }
}
