use crate::terminal::plain;

pub fn run() -> Result<(), String> {
    println!("{}", plain(saloon_games::lottery::rules()));
    Ok(())
}
