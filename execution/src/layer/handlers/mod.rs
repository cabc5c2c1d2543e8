use super::*;

fn rejected(code: ErrorCode) -> Result<Outcome> {
    Ok(Err(code))
}

mod wallet;
