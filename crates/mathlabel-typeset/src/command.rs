//! A math engine backed by an external converter program
//!
//! The program receives the math source on stdin and two arguments after
//! any configured ones: the notation (`tex` or `asciimath`) and the mode
//! (`inline` or `display`). It must print SVG markup on stdout and exit
//! successfully; anything else is a conversion failure.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread;

use mathlabel_core::{error::TypesetError, types::Notation, MathEngine, Result};

use crate::adapter::{EngineLoader, LoadCompletion};

/// Shells out to a converter for every conversion
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    fn failure(text: &str, reason: impl Into<String>) -> TypesetError {
        TypesetError::ConversionFailed {
            input: text.to_string(),
            reason: reason.into(),
        }
    }
}

impl MathEngine for CommandEngine {
    fn name(&self) -> &'static str {
        "command"
    }

    fn convert(&self, text: &str, notation: Notation, display: bool) -> Result<String> {
        let notation_arg = match notation {
            Notation::Tex => "tex",
            Notation::AsciiMath => "asciimath",
        };
        let mode_arg = if display { "display" } else { "inline" };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(notation_arg)
            .arg(mode_arg)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // A converter may exit without reading; its status decides
            if let Err(e) = stdin.write_all(text.as_bytes()) {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
        }
        let output = child.wait_with_output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Self::failure(text, stderr.trim()).into());
        }
        let svg = String::from_utf8(output.stdout)
            .map_err(|_| Self::failure(text, "output is not UTF-8"))?;
        if !svg.contains("<svg") {
            return Err(Self::failure(text, "output is not SVG").into());
        }
        Ok(svg)
    }
}

/// Probes the converter on a background thread before declaring it ready
pub struct CommandLoader {
    engine: CommandEngine,
}

impl CommandLoader {
    pub fn new(engine: CommandEngine) -> Self {
        Self { engine }
    }
}

impl EngineLoader for CommandLoader {
    fn name(&self) -> &'static str {
        "command"
    }

    fn load(&self, completion: LoadCompletion) {
        let engine = self.engine.clone();
        let spawned = thread::Builder::new()
            .name("mathlabel-engine-load".into())
            .spawn(move || {
                let probe = engine.convert("x", Notation::Tex, false);
                completion.complete(probe.map(|_| Arc::new(engine) as Arc<dyn MathEngine>));
            });
        if let Err(e) = spawned {
            // The closure owned the completion; dropping it marks the load failed
            log::warn!("could not start engine probe thread: {}", e);
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::Typesetter;

    fn script(body: &str) -> CommandEngine {
        CommandEngine::new("sh").with_args(["-c".to_string(), body.to_string(), "converter".to_string()])
    }

    #[test]
    fn passes_notation_and_mode() {
        let engine = script(r#"printf '<svg data-n="%s" data-m="%s">' "$1" "$2"; cat; printf '</svg>'"#);
        let svg = engine.convert("a+b", Notation::AsciiMath, true).unwrap();
        assert_eq!(svg, r#"<svg data-n="asciimath" data-m="display">a+b</svg>"#);
    }

    #[test]
    fn failing_program_is_conversion_failure() {
        let engine = script("echo bad >&2; exit 3");
        let err = engine.convert("x", Notation::Tex, false).unwrap_err();
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn loader_probes_before_ready() {
        let ok = Typesetter::new(Arc::new(CommandLoader::new(script("cat >/dev/null; echo '<svg/>'"))));
        assert!(ok.wait_until_settled());

        let broken = Typesetter::new(Arc::new(CommandLoader::new(script("exit 1"))));
        assert!(!broken.wait_until_settled());
        assert!(broken.has_failed());
    }
}
