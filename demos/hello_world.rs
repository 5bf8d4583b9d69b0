use std::error::Error;

use stratum::prelude::*;

#[derive(Component)]
struct Person;

#[derive(Component)]
struct Dog;

#[derive(Component, Clone)]
struct Name(&'static str);

fn main() -> Result<(), Box<dyn Error>> {
    let mut world = World::new();

    // hi
    world.spawn((Person, Name("Alexandra")))?;
    world.spawn((Dog, Name("Hiro")))?;

    let mut query = Query::<ReadOnly<Name>>::new();

    query.exec(&world)?;

    for (_, Name(name)) in query.iter() {
        println!("hello {}!", name);
    }

    Ok(())
}
