//! Phonebook CLI Client
//!
//! Sends a single request to a phonebook server and prints the reply.

use std::time::Duration;

use clap::{Parser, Subcommand};
use phonebook::config::DEFAULT_PORT;
use phonebook::network::{Client, ANONYMOUS_CLIENT};
use phonebook::protocol::Message;

/// Phonebook CLI
#[derive(Parser, Debug)]
#[command(name = "phonebook-cli")]
#[command(about = "CLI for the phonebook directory service")]
struct Args {
    /// Server address
    #[arg(short, long, default_value_t = format!("127.0.0.1:{}", DEFAULT_PORT))]
    server: String,

    /// Identity sent with the request
    #[arg(short, long, default_value = ANONYMOUS_CLIENT)]
    user: String,

    /// Receive timeout in milliseconds
    #[arg(short, long, default_value = "10000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a contact
    Add {
        /// Contact name
        name: String,

        /// Phone number (digits only)
        number: String,
    },

    /// Get a contact's number
    Get {
        /// Contact name
        name: String,
    },

    /// Remove a contact
    Remove {
        /// Contact name
        name: String,
    },

    /// Check a username and password
    Login {
        username: String,
        password: String,
    },
}

fn main() {
    let args = Args::parse();

    let client = match Client::connect(args.server.as_str(), Duration::from_millis(args.timeout_ms)) {
        Ok(client) => client.with_identity(args.user.as_str()),
        Err(e) => {
            eprintln!("Cannot reach {}: {}", args.server, e);
            std::process::exit(-1);
        }
    };

    let result = match &args.command {
        Commands::Add { name, number } => client.add_contact(name, number),
        Commands::Get { name } => client.get_contact(name),
        Commands::Remove { name } => client.remove_contact(name),
        Commands::Login { username, password } => {
            let mut client = client;
            client.login(username, password)
        }
    };

    match result {
        Ok(response) => print_response(&args.command, &response),
        Err(e) => {
            eprintln!("Request failed: {}", e);
            std::process::exit(-1);
        }
    }
}

fn print_response(command: &Commands, response: &Message) {
    match command {
        Commands::Get { .. } if response.is_accepted() => {
            println!("Server: name: {}, number: {}", response.name, response.number);
        }
        Commands::Login { username, .. } if response.is_accepted() => {
            println!("Server: Logged as {}", username);
        }
        _ => println!("Server: {}", response.name),
    }

    if !response.is_accepted() {
        std::process::exit(1);
    }
}
