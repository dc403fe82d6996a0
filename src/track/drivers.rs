// Driver codes used by the qualifying module, with the names shown to users

/// (code, full name), ordered by the qualifying module's driver ids
static DRIVERS: [(&str, &str); 31] = [
    ("ALB", "Alexander Albon"),
    ("ALO", "Fernando Alonso"),
    ("ANT", "Kimi Antonelli"),
    ("BOR", "Gabriel Bortoleto"),
    ("DOO", "Jack Doohan"),
    ("GAS", "Pierre Gasly"),
    ("HAD", "Isack Hadjar"),
    ("HAM", "Lewis Hamilton"),
    ("HUL", "Nico Hulkenberg"),
    ("LAW", "Liam Lawson"),
    ("LEC", "Charles Leclerc"),
    ("NOR", "Lando Norris"),
    ("OCO", "Esteban Ocon"),
    ("PIA", "Oscar Piastri"),
    ("RUS", "George Russell"),
    ("SAI", "Carlos Sainz"),
    ("STR", "Lance Stroll"),
    ("TSU", "Yuki Tsunoda"),
    ("VER", "Max Verstappen"),
    ("BEA", "Oliver Bearman"),
    ("BOT", "Valtteri Bottas"),
    ("LAT", "Nicholas Latifi"),
    ("MAG", "Kevin Magnussen"),
    ("MSC", "Mick Schumacher"),
    ("PER", "Sergio Perez"),
    ("RIC", "Daniel Ricciardo"),
    ("ZHO", "Zhou Guanyu"),
    ("DEV", "Nyck de Vries"),
    ("SAR", "Logan Sargeant"),
    ("VET", "Sebastian Vettel"),
    ("COL", "Franco Colapinto"),
];

/// Full name for a three-letter driver code. Matching ignores case and surrounding whitespace.
pub fn full_name(code: &str) -> Option<&'static str> {
    let code = code.trim();
    DRIVERS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}

/// Every known (code, full name) pair
pub fn all() -> &'static [(&'static str, &'static str)] {
    &DRIVERS
}
