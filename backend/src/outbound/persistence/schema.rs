//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// Films. `name` is unique; nonzero `external_id` values are unique.
    films (id) {
        id -> Int8,
        /// Catalogue identity; 0 for locally authored films.
        external_id -> Int8,
        name -> Varchar,
        episode_id -> Nullable<Int4>,
        opening_crawl -> Nullable<Text>,
        director -> Nullable<Text>,
        producer -> Nullable<Text>,
        release_date -> Nullable<Date>,
        created_at -> Timestamptz,
        edited_at -> Timestamptz,
    }
}

diesel::table! {
    /// Characters. `name` is unique; nonzero `external_id` values are unique.
    characters (id) {
        id -> Int8,
        external_id -> Int8,
        name -> Varchar,
        birth_year -> Nullable<Text>,
        eye_color -> Nullable<Text>,
        gender -> Nullable<Text>,
        hair_color -> Nullable<Text>,
        /// Height in centimetres.
        height -> Nullable<Int4>,
        mass -> Nullable<Text>,
        skin_color -> Nullable<Text>,
        homeworld -> Nullable<Text>,
        created_at -> Timestamptz,
        edited_at -> Timestamptz,
    }
}

diesel::table! {
    /// Starships. `(name, model)` is unique.
    starships (id) {
        id -> Int8,
        external_id -> Int8,
        name -> Varchar,
        model -> Varchar,
        starship_class -> Nullable<Text>,
        manufacturer -> Nullable<Text>,
        cost_in_credits -> Nullable<Text>,
        length -> Nullable<Text>,
        crew -> Nullable<Text>,
        passengers -> Nullable<Text>,
        max_atmosphering_speed -> Nullable<Text>,
        hyperdrive_rating -> Nullable<Text>,
        mglt -> Nullable<Text>,
        cargo_capacity -> Nullable<Text>,
        consumables -> Nullable<Text>,
        created_at -> Timestamptz,
        edited_at -> Timestamptz,
    }
}

diesel::table! {
    /// Films a character appears in.
    character_films (character_id, film_id) {
        character_id -> Int8,
        film_id -> Int8,
    }
}

diesel::table! {
    /// Films a starship appears in.
    starship_films (starship_id, film_id) {
        starship_id -> Int8,
        film_id -> Int8,
    }
}

diesel::table! {
    /// Characters who piloted a starship.
    starship_pilots (starship_id, character_id) {
        starship_id -> Int8,
        character_id -> Int8,
    }
}

diesel::joinable!(character_films -> characters (character_id));
diesel::joinable!(character_films -> films (film_id));
diesel::joinable!(starship_films -> starships (starship_id));
diesel::joinable!(starship_films -> films (film_id));
diesel::joinable!(starship_pilots -> starships (starship_id));
diesel::joinable!(starship_pilots -> characters (character_id));

diesel::allow_tables_to_appear_in_same_query!(
    films,
    characters,
    starships,
    character_films,
    starship_films,
    starship_pilots,
);
