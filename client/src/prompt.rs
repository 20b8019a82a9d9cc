use std::io::{self, Write};
use std::net::{IpAddr, SocketAddr};

/// Ports below this are privileged and rejected.
const PORT_MIN: u16 = 1024;

/// Collects a validated server address, re-asking on malformed input.
pub fn read_server_addr() -> io::Result<SocketAddr> {
    let ip = loop {
        let line = read_line("Enter the server IP address: ")?;
        match line.trim().parse::<IpAddr>() {
            Ok(ip) => break ip,
            Err(_) => println!("ERROR: Invalid IP address format."),
        }
    };

    let port = loop {
        let line = read_line("Enter the server port number: ")?;
        match line.trim().parse::<u16>() {
            Ok(port) if port >= PORT_MIN => break port,
            _ => println!("ERROR: Please enter a valid port number."),
        }
    };

    Ok(SocketAddr::new(ip, port))
}

pub fn read_line(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    let n = io::stdin().read_line(&mut line)?;
    if n == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_port_range_guard() {
        // The prompt loop accepts what parses as u16 and clears PORT_MIN.
        for (input, ok) in [("1024", true), ("65535", true), ("1023", false), ("70000", false), ("http", false)] {
            let accepted = matches!(input.trim().parse::<u16>(), Ok(p) if p >= super::PORT_MIN);
            assert_eq!(accepted, ok, "input {:?}", input);
        }
    }
}
