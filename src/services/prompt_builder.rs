//! 提示词构建
//!
//! 纯计算题使用简短提示词；应用题和图表题使用完整提示词，
//! 多次重复题目数量要求并附带 JSON 格式约束、示例和最终检查清单。

use std::fmt::Write as _;

use crate::models::QuestionType;

/// 未查到子技能时的默认文本
pub const DEFAULT_SUBSKILLS: &str = "General math concepts";
/// 提示词中最多列出的子技能数
const MAX_SUBSKILLS: usize = 4;
/// 完整提示词中子技能文本的最大字符数
const SUBSKILLS_CHAR_LIMIT: usize = 200;

const SYSTEM_PROMPT: &str = "You are an expert educational content generator specializing in creating \
mathematical questions aligned with US curricula standards.
You generate high-quality, pedagogically sound multiple-choice questions that test specific skills and concepts.

CRITICAL: When generating copy questions, you MUST:
1. Preserve the EXACT format and structure of the base question
2. Keep the SAME wording, phrasing, and style as the base question
3. Maintain the SAME question type and presentation style
4. Only change the numbers (for mathematical) or context (for word problems)
5. Match the base question's punctuation, capitalization, and formatting exactly";

const IMAGE_INSTRUCTION: &str = "- IMAGES: Since the base question has images, put a brief description of \
an appropriate image for each copy question in its \"image\" field (e.g. 'A diagram showing 5 apples and \
3 oranges', 'A rectangle with length 8 and width 4'). Keep descriptions short (10-20 words). Leave the \
image field empty if no image is needed.";

const SEPARATOR: &str = "================================================================================";

/// 构建提示词所需的全部输入
#[derive(Debug, Clone)]
pub struct PromptContext<'a> {
    pub base_question: &'a str,
    pub notes: Option<&'a str>,
    pub solution: Option<&'a str>,
    /// 题干附带的图片 URL
    pub image_urls: &'a [&'a str],
    /// 是否有上传的图片文件
    pub has_image_files: bool,
    pub num_options: usize,
    pub num_questions: usize,
    pub difficulty: &'a str,
    pub grade: Option<&'a str>,
    pub curriculum: Option<&'a str>,
    pub question_type: QuestionType,
    pub subskills: &'a [String],
    pub should_generate_images: bool,
}

/// system/user 提示词
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// 构建提示词
pub fn build_prompts(ctx: &PromptContext<'_>) -> PromptPair {
    let user = if ctx.question_type.is_verbose() {
        verbose_prompt(ctx)
    } else {
        compact_prompt(ctx)
    };

    PromptPair {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}

/// 子技能文本：最多 4 个，用逗号连接
pub fn subskills_text(subskills: &[String]) -> String {
    if subskills.is_empty() {
        return DEFAULT_SUBSKILLS.to_string();
    }
    subskills
        .iter()
        .take(MAX_SUBSKILLS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// 原题图片信息：优先列出 URL，只有上传文件时给出提示
fn image_info(ctx: &PromptContext<'_>) -> Option<String> {
    if !ctx.image_urls.is_empty() {
        Some(format!("Base Question Images: {}", ctx.image_urls.join(", ")))
    } else if ctx.has_image_files {
        Some("Base Question has image(s) provided".to_string())
    } else {
        None
    }
}

fn compact_prompt(ctx: &PromptContext<'_>) -> String {
    let (n, k) = (ctx.num_questions, ctx.num_options);
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "Generate EXACTLY {n} questions. Return JSON array starting with [ and ending with ]."
    );
    let _ = writeln!(
        prompt,
        "Generate {n} MCQ questions with {k} options each. Base Question: {}",
        ctx.base_question
    );
    let _ = writeln!(prompt);
    let _ = writeln!(prompt, "Rules:");
    let _ = writeln!(
        prompt,
        "- Keep EXACTLY the SAME phrasing and structure, change ONLY the numbers"
    );
    let _ = writeln!(
        prompt,
        "- Each question MUST have EXACTLY {k} options (same as base question)"
    );
    let _ = writeln!(
        prompt,
        "- ONE option per question must be marked \"CA\" (Correct Answer)"
    );
    let _ = writeln!(
        prompt,
        "- Incorrect options logic must be SHORT (3-6 words) based on student errors"
    );
    let _ = writeln!(
        prompt,
        "- Examples: \"CA\", \"Added instead of multiplied\", \"Forgot to carry over\""
    );
    if ctx.should_generate_images {
        let _ = writeln!(prompt, "{}", IMAGE_INSTRUCTION);
    }

    if let Some(notes) = ctx.notes {
        let _ = writeln!(prompt, "SME NOTES: {}", notes);
    }
    if let Some(solution) = ctx.solution {
        let _ = writeln!(prompt, "Base Solution: {}", solution);
    }
    if let Some(info) = image_info(ctx) {
        let _ = writeln!(prompt, "{}", info);
    }

    let _ = writeln!(
        prompt,
        "Return JSON array: [{{\"question\": \"...\", \"options\": [{{\"text\": \"...\", \"logic\": \"...\"}}, ...], \"image\": \"\", \"solution\": \"...\"}}, ...]"
    );
    let _ = writeln!(prompt, "Return {n} questions. Each with {k} options.");
    let _ = write!(
        prompt,
        "\nReturn [{n} questions]. Each with {k} options. JSON array format."
    );
    prompt
}

fn verbose_prompt(ctx: &PromptContext<'_>) -> String {
    let (n, k) = (ctx.num_questions, ctx.num_options);
    let mut prompt = String::new();

    prompt.push_str(&count_mandate(n));
    let _ = writeln!(
        prompt,
        "You MUST generate EXACTLY {n} distinct MCQ questions with {k} options each.\n"
    );
    let _ = writeln!(prompt, "BASE QUESTION (STUDY THIS CAREFULLY):");
    let _ = writeln!(prompt, "{}\n", ctx.base_question);

    let _ = writeln!(
        prompt,
        "CRITICAL: Every copy question must be a DIRECT variation of the BASE QUESTION above. \
         Do not switch to a different topic or concept. Change only context (names, items, scenarios) \
         and numbers while preserving the same mathematical concept, structure and phrasing.\n"
    );
    let _ = writeln!(
        prompt,
        "CRITICAL REQUIREMENT: Generate {n} SEPARATE and DISTINCT questions, each a DIFFERENT variation."
    );
    if n > 1 {
        let _ = writeln!(
            prompt,
            "REPEAT: {n} questions required. Not 1. Not {}. EXACTLY {n}.\n",
            n - 1
        );
    } else {
        let _ = writeln!(prompt, "REPEAT: EXACTLY {n} question required.\n");
    }

    prompt.push_str(&structure_rules(k));
    prompt.push_str(&context_section(ctx));

    match ctx.question_type {
        QuestionType::ImageBased => prompt.push_str(&image_based_section(k)),
        QuestionType::WordProblem => prompt.push_str(&word_problem_section(k)),
        QuestionType::Mathematical => {}
    }

    prompt.push_str(&distractor_rules(ctx));
    prompt.push_str(&output_contract(n, k));
    prompt.push_str(&final_checklist(n, k));
    prompt
}

/// 题目数量要求（开头）
fn count_mandate(n: usize) -> String {
    let mut section = String::new();
    let _ = writeln!(section, "{}", SEPARATOR);
    let _ = writeln!(section, "CRITICAL: YOU MUST GENERATE EXACTLY {n} QUESTIONS");
    let _ = writeln!(section, "{}", SEPARATOR);
    let _ = writeln!(
        section,
        "If this says {n}, you MUST return {n} question objects."
    );
    if n > 1 {
        let _ = writeln!(
            section,
            "DO NOT return only 1 question. DO NOT return fewer than {n}."
        );
    }
    let _ = writeln!(
        section,
        "FAILURE TO RETURN {n} QUESTIONS WILL CAUSE AN ERROR.\n"
    );
    let _ = writeln!(section, "YOUR RESPONSE MUST START WITH [ AND END WITH ]");
    let _ = writeln!(section, "DO NOT START WITH {{ OR RETURN A SINGLE OBJECT");
    let _ = writeln!(section, "{}\n", SEPARATOR);
    section
}

/// 结构保持要求
fn structure_rules(k: usize) -> String {
    format!(
        "CRITICAL: Follow the base question's:
- Format and structure (same sentence structure, same question type, same presentation)
- Wording and phrasing (word-for-word where possible)
- Question type (fill-in-the-blank stays fill-in-the-blank, multiple choice stays multiple choice)
- Number of options: ALL copy questions MUST have EXACTLY {k} options
- Mathematical operation (same operation, different numbers)
- Punctuation and capitalization

"
    )
}

/// SME 备注、原题解析、图片信息、课程和子技能
fn context_section(ctx: &PromptContext<'_>) -> String {
    let mut section = String::new();
    let _ = writeln!(
        section,
        "SME NOTES (CRITICAL - MUST FOLLOW IN ADDITION TO ALL PROMPT INSTRUCTIONS):"
    );
    let _ = writeln!(
        section,
        "{}",
        ctx.notes.unwrap_or("None - No specific notes provided")
    );
    let _ = writeln!(
        section,
        "SME NOTES OVERRIDE OR SUPPLEMENT THE GENERAL INSTRUCTIONS. FOLLOW THEM EXACTLY."
    );
    if let Some(solution) = ctx.solution {
        let _ = writeln!(section, "Base Solution: {}", solution);
    }
    if let Some(info) = image_info(ctx) {
        let _ = writeln!(section, "{}", info);
    }
    match (ctx.curriculum, ctx.grade) {
        (Some(curriculum), Some(grade)) => {
            let _ = writeln!(
                section,
                "Curriculum: {} | Grade: {} | Difficulty: {}",
                curriculum, grade, ctx.difficulty
            );
        }
        _ => {
            let _ = writeln!(section, "Difficulty: {}", ctx.difficulty);
        }
    }
    let subskills: String = subskills_text(ctx.subskills)
        .chars()
        .take(SUBSKILLS_CHAR_LIMIT)
        .collect();
    let _ = writeln!(section, "Subskills: {}\n", subskills);
    section
}

fn image_based_section(k: usize) -> String {
    format!(
        "IMAGE-BASED QUESTION INSTRUCTIONS
The base question contains an image, graph or table. For each copy question:

Visual similarity:
- Use the SAME type of visual (bar graph stays a bar graph, diagram stays a diagram)
- Match colors, layout, labeling conventions, scale and overall style
- Include the same elements (gridlines, axis labels, legends) as the base visual

Content:
- Test the SAME concept or skill at a similar difficulty
- Change the specific numbers, data, objects or scenario
- Make sure the question has a clear, unambiguous answer

Format:
- Keep the base question structure and any special formatting
- Describe the visual to create in the \"image\" field: type, data values, labels and styling
- The base question has {k} options, so ALL copy questions MUST have EXACTLY {k} options

Example: a bar graph of fruit sales with blue bars on a white grid becomes a bar graph of
temperatures over several days with similar blue bars, the same axis labeling and a question
about reading values from the graph.

"
    )
}

fn word_problem_section(k: usize) -> String {
    format!(
        "WORD PROBLEM INSTRUCTIONS
1. Analyze the base question: concept tested, number of steps, size and type of numbers,
   real-world scenario, given information, unknown, units.

2. Vary it:
- Context substitution: change the scenario but keep the math identical (shopping -> dining, travel -> sports)
- Names: use different, diverse names
- Numbers: keep the same relationships and computational difficulty, keep number types
- Objects: swap items within the same category (apples -> oranges, cars -> bikes)
- Time and place: different days, seasons or locations, logically consistent

3. Preserve:
- Same sentence structure, word order and grammatical style
- Same number of solution steps and the same operations
- Same problem type (find total, find difference, find rate)
- Similar word count and reading level
- EXACTLY {k} options per question

4. Check each problem: same concept, same solution approach, equivalent difficulty,
   realistic context, appropriate numbers and units, clearly stated, EXACTLY {k} options.

"
    )
}

/// 干扰项和解析要求
fn distractor_rules(ctx: &PromptContext<'_>) -> String {
    let k = ctx.num_options;
    let mut section = String::new();
    let _ = writeln!(section, "Rules:");
    let _ = writeln!(
        section,
        "- {}: CHANGE ONLY the context/real-life scenario, keep the SAME math operation, structure and question format.",
        ctx.question_type
    );
    let _ = writeln!(
        section,
        "- Each question MUST have EXACTLY {k} options, the same as the base question. No more, no fewer."
    );
    let _ = writeln!(
        section,
        "- ONE option per question must be marked \"CA\" (Correct Answer)"
    );
    let _ = writeln!(
        section,
        "- Incorrect options MUST reflect ACTUAL errors students make on this kind of problem"
    );
    let _ = writeln!(
        section,
        "- Logic must be SHORT (3-6 words) and SPECIFIC, e.g. \"CA\", \"Added instead of multiplied\", \
         \"Forgot to carry over\", \"Wrong order of operations\", \"Place value mistake\""
    );
    if ctx.solution.is_some() {
        let _ = writeln!(
            section,
            "- Write a solution for each question based on the base solution, adapted to its numbers and context"
        );
    }
    if ctx.should_generate_images {
        let _ = writeln!(section, "{}", IMAGE_INSTRUCTION);
    }
    let _ = writeln!(section);
    section
}

/// JSON 输出约束和两题示例
fn output_contract(n: usize, k: usize) -> String {
    format!(
        r#"CRITICAL JSON FORMAT REQUIREMENTS
- Your FIRST character MUST be [ and your LAST character MUST be ]
- Return ONLY a JSON array; NEVER a single object starting with {{
- NO markdown code blocks, NO explanations, NO text before [ or after ]
- Use double quotes for all strings and keep brackets balanced
- Each object has "question", "options", "image" and "solution" fields

WRONG FORMAT (DO NOT DO THIS):
{{"question": "...", "options": [...], "image": "", "solution": "..."}}

CORRECT FORMAT:
[{{"question": "...", "options": [...], "image": "", "solution": "..."}}, {{"question": "...", "options": [...], "image": "", "solution": "..."}}]

Example (base question "Sarah bought 3 apples for $2 each. How much did she spend in total?"; the example shows 4 options, yours must have {k}):
[{{"question": "Tom bought 5 oranges for $3 each. How much did he spend in total?", "options": [{{"text": "$15", "logic": "CA"}}, {{"text": "$8", "logic": "Added instead of multiplied"}}, {{"text": "$6", "logic": "Multiplied price by quantity incorrectly"}}, {{"text": "$10", "logic": "Wrong calculation"}}], "image": "", "solution": "Step 1: Multiply 5 oranges x $3 each. Step 2: 5 x 3 = 15. Step 3: Tom spent $15 in total."}}, {{"question": "Emma bought 4 bananas for $1.50 each. How much did she spend in total?", "options": [{{"text": "$6", "logic": "CA"}}, {{"text": "$5.50", "logic": "Added instead of multiplied"}}, {{"text": "$4", "logic": "Multiplied price by quantity incorrectly"}}, {{"text": "$3", "logic": "Wrong calculation"}}], "image": "", "solution": "Step 1: Multiply 4 bananas x $1.50 each. Step 2: 4 x 1.50 = 6. Step 3: Emma spent $6 in total."}}]

You MUST return an array with EXACTLY {n} objects, each a DIFFERENT question.

"#
    )
}

fn final_checklist(n: usize, k: usize) -> String {
    format!(
        "{SEPARATOR}
FINAL CHECKLIST BEFORE RESPONDING - COUNT YOUR QUESTIONS:
{SEPARATOR}
1. Count the question objects you are returning: it MUST be EXACTLY {n}
2. Each question is different (numbers, context or phrasing)
3. Each question matches the base question's format, structure and wording style
4. Each question has EXACTLY {k} options with exactly one \"CA\"
5. All SME NOTES were followed
6. The response starts with [ and ends with ], with no other text
{SEPARATOR}"
    )
}
