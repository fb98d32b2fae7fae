#[derive(Debug, Clone, Default)]
pub enum QuizState {
    #[default]
    Start,

    // PART FOR --- AUTHORING FORM ---
    ReceiveQuestionText,
    ReceiveOption {
        slot: usize,
    },
    ReceiveCorrectOption,

    // PART FOR --- EDITING ---
    ConfirmDelete {
        index: usize,
    },
}
