//! Job position catalog and interviewer prompt construction.
//!
//! Positions are read-only context supplied by the surrounding platform; the
//! session only uses them to build the interviewer's system instruction.

use serde::{Deserialize, Serialize};

/// A job opening a candidate can interview for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosition {
    pub id: String,
    pub title: String,
    pub department: String,
    pub description: String,
    pub requirements: Vec<String>,
}

impl JobPosition {
    /// System instruction for the live voice interview.
    pub fn interviewer_instruction(&self) -> String {
        format!(
            "你是湛江移动公司的资深面试官。\n\
             当前应聘岗位：{}。\n\
             \n\
             交互规则：\n\
             1. 这是一个实时语音面试。\n\
             2. 请保持耐心倾听。候选人可能在思考或停顿，不要中途打断。\n\
             3. 只有当用户明确点击结束或停止音频输入后，你才进行完整的回应和追问。\n\
             4. 你的回应要专业，结合中国移动的 5G/数字化转型背景。",
            self.title
        )
    }

    /// Shorter system instruction for the non-streaming text turn path.
    pub fn completion_instruction(&self) -> String {
        format!("你是湛江移动公司的资深面试官。岗位：{}。", self.title)
    }
}

/// The agent's scripted opening line, seeded into every new transcript.
pub const OPENING_GREETING: &str =
    "你好！我是湛江移动公司的 AI 面试官。感谢你应聘我们的岗位。在开始之前，你能简单介绍一下你自己吗？";

/// Built-in job openings.
pub fn catalog() -> Vec<JobPosition> {
    vec![
        JobPosition {
            id: "p1".to_string(),
            title: "5G 网络优化工程师".to_string(),
            department: "网络部".to_string(),
            description: "负责湛江地区 5G 基站的规划、建设与后期优化工作。".to_string(),
            requirements: vec![
                "通信工程相关专业".to_string(),
                "熟悉 5G 标准协议".to_string(),
                "具备良好的解决问题能力".to_string(),
            ],
        },
        JobPosition {
            id: "p2".to_string(),
            title: "数字化转型客户经理".to_string(),
            department: "政企客户部".to_string(),
            description: "负责为湛江当地企业提供移动信息化、云服务等综合解决方案。".to_string(),
            requirements: vec![
                "市场营销或计算机专业".to_string(),
                "具备优秀的沟通协调能力".to_string(),
                "有政企项目经验者优先".to_string(),
            ],
        },
    ]
}

/// Look up a position by id.
pub fn find(id: &str) -> Option<JobPosition> {
    catalog().into_iter().find(|p| p.id == id)
}
