//! 翻译管道模块
//!
//! 指令解析与目标语言决策，都是无状态的纯函数。

pub mod command;
pub mod resolver;

// 重新导出主要类型
pub use command::{parse_instruction, InstructionForm, ParsedInstruction};
pub use resolver::{resolve_target, ResolvedTarget};
