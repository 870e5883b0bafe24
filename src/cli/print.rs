use serde::Serialize;

use crate::application::error::AppError;

pub fn render_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to render output: {err}")))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", render_json(value)?);
    Ok(())
}
