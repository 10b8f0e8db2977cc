use crate::error::{MishError, Result};
use crate::lexer::{Operator, Token};

/// Reject operator placements no stage can be built from.
///
/// Runs on normalized tokens, before any process is created. A failure
/// abandons only the segment the tokens came from.
pub fn validate(tokens: &[Token]) -> Result<()> {
    check_redirect_counts(tokens)?;

    if tokens.first().is_some_and(|t| t.is_op(Operator::Pipe)) {
        return Err(MishError::parse("missing command before pipe"));
    }
    if tokens.last().is_some_and(|t| t.is_op(Operator::Pipe)) {
        return Err(MishError::parse("command cannot have a trailing pipe"));
    }

    for pair in tokens.windows(2) {
        match (&pair[0], &pair[1]) {
            (Token::Op(Operator::Pipe), Token::Op(Operator::Pipe)) => {
                return Err(MishError::parse("no command between pipes"));
            }
            (Token::Op(Operator::Pipe), Token::Op(Operator::RedirectIn)) => {
                return Err(MishError::parse("input redirect after pipe"));
            }
            (Token::Op(Operator::Pipe), Token::Op(Operator::RedirectOut)) => {
                return Err(MishError::parse("output redirect after pipe"));
            }
            (Token::Op(Operator::RedirectOut), Token::Op(Operator::Pipe)) => {
                return Err(MishError::parse("output redirect before pipe"));
            }
            (Token::Op(op @ (Operator::RedirectIn | Operator::RedirectOut)), Token::Op(_)) => {
                return Err(MishError::parse(format!("missing file name after '{}'", op)));
            }
            _ => {}
        }
    }

    if let Some(Token::Op(op @ (Operator::RedirectIn | Operator::RedirectOut))) = tokens.last() {
        return Err(MishError::parse(format!("missing file name after '{}'", op)));
    }

    check_every_stage_has_program(tokens)
}

/// At most one `<` and one `>` per segment, across all of its stages.
fn check_redirect_counts(tokens: &[Token]) -> Result<()> {
    let count = |op| tokens.iter().filter(|t| t.is_op(op)).count();
    if count(Operator::RedirectIn) > 1 {
        return Err(MishError::parse("multiple input redirects"));
    }
    if count(Operator::RedirectOut) > 1 {
        return Err(MishError::parse("multiple output redirects"));
    }
    Ok(())
}

/// A stage made only of a redirect (`> out`) has nothing to run.
fn check_every_stage_has_program(tokens: &[Token]) -> Result<()> {
    for stage in tokens.split(|t| t.is_op(Operator::Pipe)) {
        let mut words = 0;
        let mut skip_target = false;
        for token in stage {
            match token {
                Token::Op(_) => skip_target = true,
                Token::Word(_) if skip_target => skip_target = false,
                Token::Word(_) => words += 1,
            }
        }
        if words == 0 {
            return Err(MishError::parse("redirect without a command"));
        }
    }
    Ok(())
}
