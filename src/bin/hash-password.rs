//! Print a bcrypt hash suitable for `ADMIN_HASH_PASSWORD`.
//!
//! The password is taken from the first argument, or read from stdin so it
//! stays out of shell history.

use bcrypt::hash;
use sochlabs_backend::db::BCRYPT_COST;
use std::env;
use std::io::{self, BufRead};

fn read_password() -> Option<String> {
    if let Some(arg) = env::args().nth(1) {
        return Some(arg);
    }
    eprint!("Password: ");
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).ok()?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    (!password.is_empty()).then_some(password)
}

fn main() {
    let Some(password) = read_password() else {
        eprintln!("Usage: hash-password [PASSWORD]   (or pipe the password on stdin)");
        std::process::exit(1);
    };

    match hash(&password, BCRYPT_COST) {
        Ok(hashed) => {
            println!("Cost     : {}", BCRYPT_COST);
            println!("Hash     : {}\n", hashed);
            println!("# Paste this into your .env:");
            println!("ADMIN_HASH_PASSWORD={}", hashed);
        }
        Err(e) => {
            eprintln!("Error hashing password: {}", e);
            std::process::exit(1);
        }
    }
}
