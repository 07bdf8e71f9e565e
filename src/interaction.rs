use crate::data::{format_number, Record, Value};
use crate::ir::{Primitive, PrimitiveId};
use serde::{Deserialize, Serialize};

/// Multi-line tooltip text built from a record.
///
/// Each line may reference fields as `{field}`, `{field:.N}` (N decimals) or `{field:M}`
/// (millions, one decimal). A line starting with `?` is dropped when any field it
/// references is missing; otherwise missing fields print as `N/A`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct TooltipTemplate {
    lines: Vec<String>,
}

enum Format {
    Plain,
    Fixed(usize),
    Millions,
}

impl TooltipTemplate {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn render(&self, datum: &Record) -> String {
        self.lines
            .iter()
            .filter_map(|line| match line.strip_prefix('?') {
                Some(optional) => render_line(optional, datum, true),
                None => render_line(line, datum, false),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn render_line(line: &str, datum: &Record, optional: bool) -> Option<String> {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(open) = rest.find('{') {
        let Some(close) = rest[open..].find('}').map(|c| open + c) else {
            break;
        };
        out.push_str(&rest[..open]);
        let placeholder = &rest[open + 1..close];
        let (field, format) = match placeholder.split_once(':') {
            Some((field, "M")) => (field, Format::Millions),
            Some((field, spec)) => match spec.strip_prefix('.').and_then(|p| p.parse().ok()) {
                Some(precision) => (field, Format::Fixed(precision)),
                None => (field, Format::Plain),
            },
            None => (placeholder, Format::Plain),
        };
        let value = datum.get(field.trim());
        if optional && value.is_missing() {
            return None;
        }
        out.push_str(&format_value(value, &format));
        rest = &rest[close + 1..];
    }
    out.push_str(rest);
    Some(out)
}

fn format_value(value: &Value, format: &Format) -> String {
    match (value, format) {
        (Value::Missing, _) => "N/A".to_string(),
        (Value::Number(n), Format::Fixed(p)) => format!("{:.*}", *p, n),
        (Value::Number(n), Format::Millions) => format!("{:.1}M", n / 1_000_000.0),
        (Value::Number(n), Format::Plain) => format_number(*n),
        (Value::Text(s), _) => s.clone(),
    }
}

/// Hover lifecycle of one chart view.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HoverState {
    #[default]
    Idle,
    Hovering {
        id: PrimitiveId,
        content: String,
    },
}

impl HoverState {
    pub fn active_record_id(&self) -> Option<PrimitiveId> {
        match self {
            HoverState::Idle => None,
            HoverState::Hovering { id, .. } => Some(*id),
        }
    }

    pub fn tooltip_content(&self) -> Option<&str> {
        match self {
            HoverState::Idle => None,
            HoverState::Hovering { content, .. } => Some(content),
        }
    }
}

/// Observable effect of a pointer event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Transition {
    Entered { id: PrimitiveId, content: String },
    Exited { id: PrimitiveId },
}

/// Tracks the single active primitive and its tooltip text.
#[derive(Debug, Clone, Default)]
pub struct HoverController {
    state: HoverState,
    template: TooltipTemplate,
}

impl HoverController {
    pub fn new(template: TooltipTemplate) -> Self {
        Self {
            state: HoverState::Idle,
            template,
        }
    }

    pub fn state(&self) -> &HoverState {
        &self.state
    }

    pub fn template(&self) -> &TooltipTemplate {
        &self.template
    }

    /// Pointer entered a primitive. Any other active primitive is exited first.
    pub fn enter(&mut self, primitive: &Primitive) -> Vec<Transition> {
        let mut transitions = Vec::new();
        match self.state.active_record_id() {
            Some(id) if id == primitive.id => return transitions,
            Some(id) => transitions.push(Transition::Exited { id }),
            None => {}
        }
        let content = self.template.render(&primitive.datum);
        tracing::trace!(id = primitive.id, "hover enter");
        self.state = HoverState::Hovering {
            id: primitive.id,
            content: content.clone(),
        };
        transitions.push(Transition::Entered {
            id: primitive.id,
            content,
        });
        transitions
    }

    /// Pointer left whatever was active.
    pub fn leave(&mut self) -> Option<Transition> {
        match std::mem::take(&mut self.state) {
            HoverState::Idle => None,
            HoverState::Hovering { id, .. } => {
                tracing::trace!(id, "hover leave");
                Some(Transition::Exited { id })
            }
        }
    }

    /// Pointer left a specific primitive; ignored when it is not the active one.
    pub fn leave_primitive(&mut self, id: PrimitiveId) -> Option<Transition> {
        if self.state.active_record_id() == Some(id) {
            self.leave()
        } else {
            None
        }
    }
}
