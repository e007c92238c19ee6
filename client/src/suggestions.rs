/// Starter prompts offered on an empty chat.
pub const SUGGESTIONS: [&str; 5] = [
    "Favór ida fó ezemplu karta aplikasaun ba vaga finansas!",
    "Ajuda hakerek email ida ba konvite reuniaun negósiu nian.",
    "Tradús testu ne'e ba Portugés: Ha'u hadomi Timor-Leste.",
    "Oinsá situasaun edukasaun daudaun ne'e iha Timor-Leste?",
    "Favór kuriji ortografia Tetun: \"Nia ne kole tanba hlo serbicu barak.\"",
];

/// Suggestions to show for the current input. They disappear once the user types.
pub fn suggestions(input: &str) -> &'static [&'static str] {
    if input.trim().is_empty() {
        &SUGGESTIONS
    } else {
        &[]
    }
}
