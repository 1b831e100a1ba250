use std::io::Error as IoError;

use zeroize::Zeroizing;

pub fn get_password_from_tty(prompt: &str) -> Result<Zeroizing<String>, IoError> {
    let password = rpassword::prompt_password(prompt)?;
    Ok(Zeroizing::new(password))
}
