use colored::Colorize;

pub struct Theme {
    pub model: fn(&str) -> String,
    pub id: fn(&str) -> String,
    pub field: fn(&str) -> String,
    pub value: fn(&str) -> String,
    pub dynamic: fn(&str) -> String,
    pub line: fn(&str) -> String,
    pub summary: fn(&str) -> String,
}

impl Theme {
    pub fn from_name(name: &str) -> Self {
        match name {
            "temp" | "" => Self::temp(),
            "wudao" => Self::wudao(),
            "canvas" => Self::canvas(),
            "plain" => Self::plain(),
            _ => {
                eprintln!("{}", format!("✘ Unknown theme: {}", name).red());
                Self::temp() // Fallback to default
            }
        }
    }

    fn temp() -> Self {
        Self {
            model: |s| s.bright_magenta().italic().bold().to_string(),
            id: |s| s.bright_black().to_string(),
            field: |s| s.cyan().to_string(),
            value: |s| s.white().to_string(),
            dynamic: |s| s.yellow().italic().to_string(),
            line: |s| s.bright_black().dimmed().to_string(),
            summary: |s| s.bright_white().dimmed().italic().to_string(),
        }
    }

    fn wudao() -> Self {
        Self {
            model: |s| s.red().italic().bold().to_string(),
            id: |s| s.cyan().to_string(),
            field: |s| s.green().italic().to_string(),
            value: |s| s.bright_white().to_string(),
            dynamic: |s| s.bright_yellow().dimmed().italic().to_string(),
            line: |s| s.bright_black().dimmed().to_string(),
            summary: |s| s.red().italic().to_string(),
        }
    }

    fn canvas() -> Self {
        Self {
            model: |s| s.blue().bold().to_string(),
            id: |s| s.magenta().to_string(),
            field: |s| s.bright_cyan().bold().to_string(),
            value: |s| s.black().to_string(),
            dynamic: |s| s.green().italic().to_string(),
            line: |s| s.bright_black().dimmed().to_string(),
            summary: |s| s.red().bold().to_string(),
        }
    }

    fn plain() -> Self {
        Self {
            model: |s| s.to_string(),
            id: |s| s.to_string(),
            field: |s| s.to_string(),
            value: |s| s.to_string(),
            dynamic: |s| s.to_string(),
            line: |s| s.to_string(),
            summary: |s| s.to_string(),
        }
    }
}
