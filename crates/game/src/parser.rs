use std::io::BufRead;

use gr1_bdd::Bdd;
use gr1_bdd::BddOps;
use gr1_bdd::Manager;
use gr1_io::LineIterator;
use gr1_utilities::Gr1Error;

use crate::context::GameContext;
use crate::context::GameContextBuilder;
use crate::variables::VariableType;

/// Which section of the input file is currently being read. Mirrors the
/// eight recognized section headers one for one.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Section {
    None,
    Input,
    Output,
    EnvInit,
    SysInit,
    EnvTrans,
    SysTrans,
    EnvLiveness,
    SysLiveness,
}

impl Section {
    fn from_header(header: &str) -> Option<Section> {
        match header {
            "INPUT" => Some(Section::Input),
            "OUTPUT" => Some(Section::Output),
            "ENV_INIT" => Some(Section::EnvInit),
            "SYS_INIT" => Some(Section::SysInit),
            "ENV_TRANS" => Some(Section::EnvTrans),
            "SYS_TRANS" => Some(Section::SysTrans),
            "ENV_LIVENESS" => Some(Section::EnvLiveness),
            "SYS_LIVENESS" => Some(Section::SysLiveness),
            _ => None,
        }
    }

    /// Which variable categories a formula in this section may reference.
    /// `None` for the two declaration sections, which never hold formulas.
    fn allowed_types(self) -> Option<fn(VariableType) -> bool> {
        match self {
            Section::EnvInit => Some(|t| matches!(t, VariableType::PreInput)),
            Section::SysInit => Some(|t| matches!(t, VariableType::PreInput | VariableType::PreOutput)),
            Section::EnvTrans => {
                Some(|t| matches!(t, VariableType::PreInput | VariableType::PreOutput | VariableType::PostInput))
            }
            Section::SysTrans | Section::EnvLiveness | Section::SysLiveness => Some(|_| true),
            Section::Input | Section::Output | Section::None => None,
        }
    }
}

/// Reads a specification from `reader`, allocating its variables and
/// formulas against `manager`, and returns the resulting game context.
pub fn parse_specification(reader: impl BufRead, manager: &Manager) -> Result<GameContext, Gr1Error> {
    let mut builder = GameContextBuilder::new(manager);
    let mut section = Section::None;

    for entry in LineIterator::new(reader) {
        let (line_no, raw) = entry?;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            section = Section::from_header(name).ok_or_else(|| Gr1Error::Parse {
                line: line_no,
                message: format!("unrecognized section header '[{name}]'"),
            })?;
            continue;
        }

        match section {
            Section::None => {
                return Err(Gr1Error::Parse {
                    line: line_no,
                    message: "content before the first section header".to_string(),
                });
            }
            Section::Input => declare(&mut builder, manager, line, line_no, VariableType::PreInput, VariableType::PostInput)?,
            Section::Output => declare(&mut builder, manager, line, line_no, VariableType::PreOutput, VariableType::PostOutput)?,
            Section::EnvInit => {
                let f = parse_formula_line(line, line_no, builder.vars(), manager, section.allowed_types().unwrap())?;
                builder.conjoin_init_e(&f)?;
            }
            Section::SysInit => {
                let f = parse_formula_line(line, line_no, builder.vars(), manager, section.allowed_types().unwrap())?;
                builder.conjoin_init_s(&f)?;
            }
            Section::EnvTrans => {
                let f = parse_formula_line(line, line_no, builder.vars(), manager, section.allowed_types().unwrap())?;
                builder.conjoin_safe_e(&f)?;
            }
            Section::SysTrans => {
                let f = parse_formula_line(line, line_no, builder.vars(), manager, section.allowed_types().unwrap())?;
                builder.conjoin_safe_s(&f)?;
            }
            Section::EnvLiveness => {
                let f = parse_formula_line(line, line_no, builder.vars(), manager, section.allowed_types().unwrap())?;
                builder.push_liv_e(f);
            }
            Section::SysLiveness => {
                let f = parse_formula_line(line, line_no, builder.vars(), manager, section.allowed_types().unwrap())?;
                builder.push_liv_g(f);
            }
        }
    }

    builder.finalize(manager)
}

fn declare(
    builder: &mut GameContextBuilder,
    manager: &Manager,
    name: &str,
    line_no: usize,
    pre_kind: VariableType,
    post_kind: VariableType,
) -> Result<(), Gr1Error> {
    builder
        .vars_mut()
        .add_variable_pair(manager, pre_kind, post_kind, name)
        .map(|_| ())
        .map_err(|e| match e {
            Gr1Error::Semantic { message, .. } => Gr1Error::Semantic { line: line_no, message },
            other => other,
        })
}

/// Parses one prefix-notation formula line, starting a fresh memo table
/// scoped to this line (the `$`/`?` sharing operators only refer back
/// within the expression that declared them).
fn parse_formula_line(
    line: &str,
    line_no: usize,
    vars: &crate::variables::VariableManager,
    manager: &Manager,
    allowed: fn(VariableType) -> bool,
) -> Result<Bdd, Gr1Error> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut cursor = FormulaCursor {
        tokens: &tokens,
        pos: 0,
        vars,
        manager,
        memos: Vec::new(),
        line_no,
        allowed,
    };
    let result = cursor.parse_expr()?;
    if cursor.pos != tokens.len() {
        return Err(Gr1Error::Parse {
            line: line_no,
            message: "trailing tokens after a complete formula".to_string(),
        });
    }
    Ok(result)
}

struct FormulaCursor<'a> {
    tokens: &'a [&'a str],
    pos: usize,
    vars: &'a crate::variables::VariableManager,
    manager: &'a Manager,
    memos: Vec<Bdd>,
    line_no: usize,
    allowed: fn(VariableType) -> bool,
}

impl<'a> FormulaCursor<'a> {
    fn next_token(&mut self) -> Result<&'a str, Gr1Error> {
        let token = self.tokens.get(self.pos).copied().ok_or_else(|| Gr1Error::Parse {
            line: self.line_no,
            message: "unexpected end of formula".to_string(),
        })?;
        self.pos += 1;
        Ok(token)
    }

    fn parse_usize(&mut self) -> Result<usize, Gr1Error> {
        let token = self.next_token()?;
        gr1_io::parse_natural_number(token).map_err(|_| Gr1Error::Parse {
            line: self.line_no,
            message: format!("expected a natural number, found '{token}'"),
        })
    }

    fn parse_expr(&mut self) -> Result<Bdd, Gr1Error> {
        let token = self.next_token()?;
        match token {
            "|" => {
                let a = self.parse_expr()?;
                let b = self.parse_expr()?;
                Ok(a.or(&b)?)
            }
            "&" => {
                let a = self.parse_expr()?;
                let b = self.parse_expr()?;
                Ok(a.and(&b)?)
            }
            "!" => {
                let a = self.parse_expr()?;
                Ok(a.not()?)
            }
            "0" => Ok(self.manager.f()),
            "1" => Ok(self.manager.t()),
            "$" => {
                let count = self.parse_usize()?;
                let mut last = None;
                for _ in 0..count {
                    let entry = self.parse_expr()?;
                    self.memos.push(entry.clone());
                    last = Some(entry);
                }
                last.ok_or_else(|| Gr1Error::Parse {
                    line: self.line_no,
                    message: "'$' requires at least one memo entry".to_string(),
                })
            }
            "?" => {
                let index = self.parse_usize()?;
                self.memos.get(index).cloned().ok_or_else(|| Gr1Error::Parse {
                    line: self.line_no,
                    message: format!("memo entry {index} was never declared"),
                })
            }
            name => {
                let index = self.vars.find_by_name(name).ok_or_else(|| Gr1Error::Semantic {
                    line: self.line_no,
                    message: format!("unresolved identifier '{name}'"),
                })?;
                let kind = self.vars.kind(index);
                if !(self.allowed)(kind) {
                    return Err(Gr1Error::Semantic {
                        line: self.line_no,
                        message: format!("'{name}' has a type not permitted in this section"),
                    });
                }
                Ok(self.vars.handle(index).clone())
            }
        }
    }
}
