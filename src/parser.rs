use crate::error::{MishError, Result};
use crate::lexer::{self, Operator, Token};
use crate::validator;

/// One program invocation with its own argument list and optional redirects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stage {
    /// Program name followed by its arguments. Never contains operators or
    /// redirect targets.
    pub args: Vec<String>,
    /// File to read standard input from (`< file`).
    pub input: Option<String>,
    /// File to write standard output and error to (`> file`).
    pub output: Option<String>,
}

impl Stage {
    pub fn program(&self) -> &str {
        &self.args[0]
    }
}

/// Stages connected by anonymous pipes, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub stages: Vec<Stage>,
}

impl Pipeline {
    /// Number of pipes needed to connect the stages.
    pub fn pipe_count(&self) -> usize {
        self.stages.len() - 1
    }
}

/// Split validated tokens into stages at every `|`.
///
/// Expects tokens that already passed [`validator::validate`]; a redirect
/// operator missing its target is still reported rather than panicking.
pub fn build_pipeline(tokens: &[Token]) -> Result<Pipeline> {
    let mut stages = Vec::new();

    for stage_tokens in tokens.split(|t| t.is_op(Operator::Pipe)) {
        let mut stage = Stage::default();
        let mut iter = stage_tokens.iter();
        while let Some(token) = iter.next() {
            match token {
                Token::Word(word) => stage.args.push(word.clone()),
                Token::Op(op) => {
                    let target = match iter.next() {
                        Some(Token::Word(target)) => target.clone(),
                        _ => return Err(MishError::parse(format!("missing file name after '{}'", op))),
                    };
                    match op {
                        Operator::RedirectIn => stage.input = Some(target),
                        Operator::RedirectOut => stage.output = Some(target),
                        Operator::Pipe => unreachable!("split() consumes pipes"),
                    }
                }
            }
        }
        if stage.args.is_empty() {
            return Err(MishError::parse("empty command"));
        }
        stages.push(stage);
    }

    Ok(Pipeline { stages })
}

/// Tokenize, validate and build a pipeline from one segment of a line.
pub fn parse_segment(segment: &str) -> Result<Pipeline> {
    let tokens = lexer::tokenize(segment);
    if tokens.is_empty() {
        return Err(MishError::parse("empty command"));
    }
    validator::validate(&tokens)?;
    build_pipeline(&tokens)
}
