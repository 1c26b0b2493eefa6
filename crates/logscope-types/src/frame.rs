use serde::{Deserialize, Serialize};
use std::fmt;

/// Runtime ecosystem whose signature marked a frame as framework code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ecosystem {
    /// Flutter / Android UI framework packages
    MobileUi,
    /// `dart:` core library namespace
    DartSdk,
    /// Third-party dependency directories (node_modules, pub-cache, ...)
    Vendor,
    /// `<anonymous>`, `<asynchronous suspension>`, native markers
    Anonymous,
    /// Go runtime sources
    GoRuntime,
    /// Java standard library and JDK internals
    Java,
    /// Kotlin standard library and coroutines
    Kotlin,
    /// .NET base class library
    DotNet,
}

impl Ecosystem {
    pub fn label(&self) -> &'static str {
        match self {
            Ecosystem::MobileUi => "mobile-ui",
            Ecosystem::DartSdk => "dart-sdk",
            Ecosystem::Vendor => "vendor",
            Ecosystem::Anonymous => "anonymous",
            Ecosystem::GoRuntime => "go-runtime",
            Ecosystem::Java => "java",
            Ecosystem::Kotlin => "kotlin",
            Ecosystem::DotNet => "dotnet",
        }
    }
}

/// A `path:line[:column]` reference found in a frame or log line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

impl SourceRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line: None,
            column: None,
        }
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Final path component, used as the lookup key for workspace searches.
    pub fn file_name(&self) -> &str {
        self.path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.path.as_str())
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
            if let Some(column) = self.column {
                write!(f, ":{}", column)?;
            }
        }
        Ok(())
    }
}

/// One stack-trace entry, classified once at extraction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    pub text: String,
    pub is_app: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<SourceRef>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSummary {
    pub total: usize,
    pub app: usize,
    pub framework: usize,
}

impl FrameSummary {
    pub fn from_frames(frames: &[StackFrame]) -> Self {
        let app = frames.iter().filter(|f| f.is_app).count();
        Self {
            total: frames.len(),
            app,
            framework: frames.len() - app,
        }
    }
}

impl fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames ({} app, {} framework)",
            self.total, self.app, self.framework
        )
    }
}
