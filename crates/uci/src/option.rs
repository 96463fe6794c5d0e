//! UCI `option` declarations sent by the engine during the handshake.

use crate::UciError;

/// Option type as declared by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionKind {
    Check,
    Spin,
    Combo,
    Button,
    String,
}

/// One `option name <id> type <t> [default <x>] [min <x>] [max <x>] [var <x>]*` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDecl {
    /// Option name; may contain spaces ("Skill Level").
    pub name: String,
    pub kind: OptionKind,
    pub default: Option<String>,
    pub min: Option<i64>,
    pub max: Option<i64>,
    /// Allowed values of a combo option.
    pub vars: Vec<String>,
}

impl OptionDecl {
    /// Parse an `option` line.
    pub fn parse(line: &str) -> Result<Self, UciError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.first() != Some(&"option") || parts.get(1) != Some(&"name") {
            return Err(UciError::ParseError(format!(
                "Expected 'option name', got '{}'",
                line
            )));
        }

        let type_idx = parts
            .iter()
            .position(|p| *p == "type")
            .ok_or_else(|| UciError::ParseError(format!("Option without type: '{}'", line)))?;
        let name = parts[2..type_idx].join(" ");
        if name.is_empty() {
            return Err(UciError::ParseError(format!("Option without name: '{}'", line)));
        }

        let kind = match parts.get(type_idx + 1) {
            Some(&"check") => OptionKind::Check,
            Some(&"spin") => OptionKind::Spin,
            Some(&"combo") => OptionKind::Combo,
            Some(&"button") => OptionKind::Button,
            Some(&"string") => OptionKind::String,
            other => {
                return Err(UciError::ParseError(format!(
                    "Unknown option type {:?} in '{}'",
                    other, line
                )))
            }
        };

        let mut decl = OptionDecl {
            name,
            kind,
            default: None,
            min: None,
            max: None,
            vars: Vec::new(),
        };

        let mut i = type_idx + 2;
        while i < parts.len() {
            match parts[i] {
                "default" => {
                    // String defaults may be empty or contain spaces
                    let end = next_keyword(&parts, i + 1);
                    decl.default = Some(parts[i + 1..end].join(" "));
                    i = end;
                    continue;
                }
                "min" => {
                    i += 1;
                    decl.min = parts.get(i).and_then(|v| v.parse().ok());
                }
                "max" => {
                    i += 1;
                    decl.max = parts.get(i).and_then(|v| v.parse().ok());
                }
                "var" => {
                    let end = next_keyword(&parts, i + 1);
                    decl.vars.push(parts[i + 1..end].join(" "));
                    i = end;
                    continue;
                }
                _ => {}
            }
            i += 1;
        }

        Ok(decl)
    }

    /// Clamp a spin value into the declared range.
    pub fn clamp(&self, value: i64) -> i64 {
        let value = self.min.map_or(value, |min| value.max(min));
        self.max.map_or(value, |max| value.min(max))
    }
}

fn next_keyword(parts: &[&str], from: usize) -> usize {
    parts[from..]
        .iter()
        .position(|p| matches!(*p, "default" | "min" | "max" | "var"))
        .map_or(parts.len(), |offset| from + offset)
}
