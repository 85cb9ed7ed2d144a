//! 课程子技能表
//!
//! 内置一份常用课程标准的子技能（编译期 phf 表），可通过 `CURRICULUM_FILE`
//! 指定 JSON 文件整体替换。JSON 结构：`{"COMMON_CORE": {"Grade_3": ["...", ...]}}`。

use std::collections::HashMap;
use std::path::Path;

use phf::phf_map;
use tracing::{info, warn};

use crate::error::FileError;

/// 外部课程表：课程键 → 年级键 → 子技能
pub type CurriculumTable = HashMap<String, HashMap<String, Vec<String>>>;

/// 内置子技能，键为 "课程键/年级键"
static BUILTIN_SUBSKILLS: phf::Map<&'static str, &'static [&'static str]> = phf_map! {
    "COMMON_CORE/Kindergarten" => &[
        "Count to 100 by ones and tens",
        "Compare numbers within 10",
        "Add and subtract within 10",
        "Identify and describe shapes",
    ],
    "COMMON_CORE/Grade_1" => &[
        "Add and subtract within 20",
        "Understand place value for tens and ones",
        "Measure lengths indirectly",
        "Tell and write time in hours and half-hours",
    ],
    "COMMON_CORE/Grade_2" => &[
        "Add and subtract within 100",
        "Understand place value to 1000",
        "Solve problems involving money",
        "Measure and estimate lengths in standard units",
    ],
    "COMMON_CORE/Grade_3" => &[
        "Multiply and divide within 100",
        "Solve two-step word problems using the four operations",
        "Understand fractions as numbers",
        "Find area and perimeter of rectangles",
    ],
    "COMMON_CORE/Grade_4" => &[
        "Multiply multi-digit whole numbers",
        "Find equivalent fractions",
        "Add and subtract fractions with like denominators",
        "Convert measurements within one system",
    ],
    "COMMON_CORE/Grade_5" => &[
        "Add and subtract fractions with unlike denominators",
        "Multiply and divide decimals to hundredths",
        "Find volume of rectangular prisms",
        "Graph points on the coordinate plane",
    ],
    "COMMON_CORE/Grade_6" => &[
        "Understand ratio concepts and unit rates",
        "Divide fractions by fractions",
        "Write and evaluate numerical expressions with exponents",
        "Solve one-step equations",
    ],
    "COMMON_CORE/Grade_7" => &[
        "Solve problems with proportional relationships",
        "Add, subtract, multiply and divide rational numbers",
        "Solve multi-step problems with percents",
        "Find area and circumference of circles",
    ],
    "COMMON_CORE/Grade_8" => &[
        "Work with integer exponents and scientific notation",
        "Solve linear equations in one variable",
        "Understand and compare functions",
        "Apply the Pythagorean theorem",
    ],
    "TEKS/Grade_3" => &[
        "Represent and solve one-step and two-step problems",
        "Determine the value of a collection of coins and bills",
        "Represent fractions of halves, fourths and eighths",
        "Determine perimeter of polygons",
    ],
    "TEKS/Grade_4" => &[
        "Represent the value of the digit in whole numbers through 1,000,000,000",
        "Solve with fluency one- and two-step problems involving money",
        "Determine products of a 3-digit by 1-digit number",
        "Solve problems involving angle measures",
    ],
    "TEKS/Grade_5" => &[
        "Solve with proficiency multi-step problems using the four operations",
        "Represent and solve addition and subtraction of fractions",
        "Calculate volume of rectangular prisms",
        "Compare income and payroll deductions",
    ],
};

/// 课程名称转为表键："Common Core" → "COMMON_CORE"
pub fn curriculum_key(curriculum: &str) -> String {
    curriculum.trim().replace(' ', "_").to_uppercase()
}

/// 年级转为表键："K" → "Kindergarten"，"3" → "Grade_3"
pub fn grade_key(grade: &str) -> String {
    let grade = grade.trim();
    if grade.eq_ignore_ascii_case("k") {
        "Kindergarten".to_string()
    } else {
        format!("Grade_{}", grade)
    }
}

/// 子技能查询
#[derive(Debug, Clone, Default)]
pub struct Curriculum {
    /// 外部 JSON 表；为空时使用内置表
    custom: Option<CurriculumTable>,
}

impl Curriculum {
    pub fn builtin() -> Self {
        Self::default()
    }

    pub fn from_table(table: CurriculumTable) -> Self {
        Self {
            custom: Some(table),
        }
    }

    /// 加载课程表，文件缺失或格式错误时退回内置表
    pub async fn load(path: Option<&str>) -> Self {
        let Some(path) = path else {
            return Self::builtin();
        };

        match read_table(Path::new(path)).await {
            Ok(table) => {
                info!("📚 已加载课程表 {}，共 {} 套课程", path, table.len());
                Self::from_table(table)
            }
            Err(e) => {
                warn!("⚠️ 课程表加载失败，使用内置子技能: {}", e);
                Self::builtin()
            }
        }
    }

    /// 查询某年级某课程的子技能；未收录时返回空列表
    pub fn subskills(&self, grade: &str, curriculum: &str) -> Vec<String> {
        let curriculum = curriculum_key(curriculum);
        let grade = grade_key(grade);

        match &self.custom {
            Some(table) => table
                .get(&curriculum)
                .and_then(|grades| grades.get(&grade))
                .cloned()
                .unwrap_or_default(),
            None => BUILTIN_SUBSKILLS
                .get(format!("{}/{}", curriculum, grade).as_str())
                .map(|skills| skills.iter().map(|s| s.to_string()).collect())
                .unwrap_or_default(),
        }
    }
}

async fn read_table(path: &Path) -> Result<CurriculumTable, FileError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| FileError::ReadFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    serde_json::from_str(&content).map_err(|e| FileError::ParseFailed {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        assert_eq!(curriculum_key("Common Core"), "COMMON_CORE");
        assert_eq!(curriculum_key("teks"), "TEKS");
        assert_eq!(grade_key("K"), "Kindergarten");
        assert_eq!(grade_key("5"), "Grade_5");
    }

    #[test]
    fn test_builtin_lookup() {
        let curriculum = Curriculum::builtin();
        let skills = curriculum.subskills("3", "Common Core");
        assert_eq!(skills.len(), 4);
        assert_eq!(skills[0], "Multiply and divide within 100");

        assert!(!curriculum.subskills("K", "common core").is_empty());
        assert!(curriculum.subskills("12", "Common Core").is_empty());
        assert!(curriculum.subskills("3", "Unknown Standard").is_empty());
    }

    #[test]
    fn test_custom_table_replaces_builtin() {
        let table: CurriculumTable = serde_json::from_str(
            r#"{"STATE_STANDARD": {"Grade_2": ["Skip counting", "Even and odd numbers"]}}"#,
        )
        .unwrap();
        let curriculum = Curriculum::from_table(table);

        assert_eq!(
            curriculum.subskills("2", "State Standard"),
            vec!["Skip counting", "Even and odd numbers"]
        );
        assert!(curriculum.subskills("3", "Common Core").is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_falls_back_to_builtin() {
        let curriculum = Curriculum::load(Some("/nonexistent/curriculum.json")).await;
        assert!(!curriculum.subskills("4", "Common Core").is_empty());
    }
}
