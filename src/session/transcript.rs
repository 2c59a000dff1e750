//! Append-only conversation transcript.

use console::style;

/// Who a transcript line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    fn label(&self) -> &'static str {
        match self {
            Role::User => "You:",
            Role::Assistant => "Assistant:",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptLine {
    pub role: Role,
    pub text: String,
}

/// Lines are only ever appended; the newest is always last.
#[derive(Debug, Default)]
pub struct Transcript {
    lines: Vec<TranscriptLine>,
    render: bool,
}

impl Transcript {
    /// Create a transcript; when `render` is set each new line is printed to stdout.
    pub fn new(render: bool) -> Self {
        Self {
            lines: Vec::new(),
            render,
        }
    }

    pub fn push(&mut self, role: Role, text: &str) {
        let line = TranscriptLine {
            role,
            text: text.to_string(),
        };
        if self.render {
            print_line(&line);
        }
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[TranscriptLine] {
        &self.lines
    }

    pub fn last(&self) -> Option<&TranscriptLine> {
        self.lines.last()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn print_line(line: &TranscriptLine) {
    match line.role {
        Role::User => println!("{} {}", style(line.role.label()).green().bold(), line.text),
        Role::Assistant => println!(
            "\n{} {}\n",
            style(line.role.label()).cyan().bold(),
            line.text
        ),
    }
}
