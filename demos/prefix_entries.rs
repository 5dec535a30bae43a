use forest::PrefixMap;

fn print_entries(map: &PrefixMap<char, i32>, prefix: &str) {
    let prefix: Vec<char> = prefix.chars().collect();
    for (key, value) in map.entries(&prefix) {
        println!("{} {}", key.into_iter().collect::<String>(), value);
    }
}

fn main() {
    let mut map = PrefixMap::new();
    for (i, word) in ["hello", "world", "heaven", "hell", "healthy"].iter().enumerate() {
        let key: Vec<char> = word.chars().collect();
        if let Err(err) = map.insert(&key, i as i32 + 1) {
            println!("{err}");
            return;
        }
    }

    println!("All entries:");
    print_entries(&map, "");

    println!("Entries with prefix `hea`:");
    print_entries(&map, "hea");

    println!("Entries with prefix `hell`:");
    print_entries(&map, "hell");
}
