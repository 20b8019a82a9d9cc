use std::io::{self, Write};

/// Ports below this are privileged and rejected.
const PORT_MIN: u16 = 1024;

/// Prompts until the input parses as a port in [1024, 65535].
pub fn read_port(prompt: &str) -> io::Result<u16> {
    loop {
        let line = read_line(prompt)?;
        match line.trim().parse::<u16>() {
            Ok(port) if port >= PORT_MIN => return Ok(port),
            _ => println!("ERROR: Please enter a valid port number."),
        }
    }
}

fn read_line(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    let n = io::stdin().read_line(&mut line)?;
    if n == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
