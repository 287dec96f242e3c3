//! Static career clue and career-code reference data used to populate
//! bingo cards and ask questions (§3 CareerClue).

use adaptive_domain::CareerClue;
use once_cell::sync::Lazy;

/// The 25-career pool a bingo card is drawn from (5x5 grid).
pub static CAREER_POOL: Lazy<Vec<String>> = Lazy::new(|| {
    [
        "Chef", "Vet", "Astronaut", "Doctor", "Engineer", "Teacher", "Artist", "Firefighter",
        "Pilot", "Scientist", "Farmer", "Nurse", "Architect", "Musician", "Police Officer",
        "Dentist", "Programmer", "Electrician", "Plumber", "Librarian", "Photographer",
        "Journalist", "Carpenter", "Zookeeper", "Baker",
    ]
    .into_iter()
    .map(String::from)
    .collect()
});

pub static CAREER_CLUES: Lazy<Vec<CareerClue>> = Lazy::new(|| {
    vec![
        clue("clue-chef-1", "Chef", "I count ingredients and follow recipes step by step.", "Counting", "easy"),
        clue("clue-vet-1", "Vet", "I care for sick animals and check their weight.", "Measurement", "easy"),
        clue("clue-astronaut-1", "Astronaut", "I calculate distances between planets.", "Large Numbers", "medium"),
        clue("clue-doctor-1", "Doctor", "I track a patient's heart rate over time.", "Rates", "medium"),
        clue("clue-engineer-1", "Engineer", "I measure angles to build strong bridges.", "Geometry", "hard"),
        clue("clue-teacher-1", "Teacher", "I count how many students are in class today.", "Counting", "easy"),
        clue("clue-artist-1", "Artist", "I mix colors in equal parts to make new ones.", "Fractions", "medium"),
        clue("clue-firefighter-1", "Firefighter", "I estimate how much water is left in the tank.", "Estimation", "medium"),
        clue("clue-pilot-1", "Pilot", "I calculate flight time using speed and distance.", "Rates", "hard"),
        clue("clue-scientist-1", "Scientist", "I record measurements in a data table.", "Data", "medium"),
    ]
});

fn clue(id: &str, career_code: &str, clue_text: &str, skill_connection: &str, difficulty: &str) -> CareerClue {
    let distractor_careers = CAREER_POOL
        .iter()
        .filter(|c| c.as_str() != career_code)
        .cloned()
        .collect();

    CareerClue {
        id: id.to_string(),
        career_code: career_code.to_string(),
        clue_text: clue_text.to_string(),
        skill_connection: skill_connection.to_string(),
        difficulty: difficulty.to_string(),
        grade_category: "K-5".to_string(),
        distractor_careers,
    }
}
