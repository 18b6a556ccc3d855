// Tests for the job position catalog and interviewer prompts

use viva::position;

#[test]
fn test_catalog_positions_are_complete() {
    let catalog = position::catalog();
    assert_eq!(catalog.len(), 2);
    for pos in &catalog {
        assert!(!pos.title.is_empty());
        assert!(!pos.department.is_empty());
        assert!(!pos.requirements.is_empty());
    }
}

#[test]
fn test_find_by_id() {
    let pos = position::find("p1").expect("p1 exists");
    assert_eq!(pos.title, "5G 网络优化工程师");

    assert!(position::find("p999").is_none());
}

#[test]
fn test_interviewer_instruction_names_the_position() {
    let pos = position::find("p2").unwrap();
    let instruction = pos.interviewer_instruction();
    assert!(instruction.contains("数字化转型客户经理"));
    assert!(instruction.contains("实时语音面试"));

    let completion = pos.completion_instruction();
    assert!(completion.contains("数字化转型客户经理"));
}

#[test]
fn test_opening_greeting_is_seeded_text() {
    assert!(position::OPENING_GREETING.contains("AI 面试官"));
}
