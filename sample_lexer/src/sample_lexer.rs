use anyhow::{bail, Result};
use std::fs::File;
use std::io::Read;

use atnlex::{Lexer, StringCharStream};
use sample_lexer::demo_grammar;

fn read_file_to_string(filename: &str) -> Result<String> {
    let mut file = File::open(filename)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(content)
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        bail!("usage: {} <input-file>", args[0]);
    }
    let text = read_file_to_string(&args[1])?;

    let atn = demo_grammar();
    let mut lexer = Lexer::new(atn, Box::new(StringCharStream::named(&text, &args[1])));
    for token in lexer.all_tokens()? {
        let mut shown = token.clone();
        shown.set_text(lexer.text_of(&token));
        println!("{}", shown);
    }
    println!("{}", lexer.stats().to_json());
    Ok(())
}
