//! 替换模式展开
//!
//! 解析替换串中的捕获组引用（`$1`、`$&`、`$$`）、转义（`\n`、`\t`、
//! `\\`）与大小写修饰（`\u` `\l` `\U` `\L` `\E`），按匹配逐个展开。
//! 仅正则模式使用；字面量搜索的替换串原样写入。

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaseOp {
    UpperFirst,
    LowerFirst,
    UpperAll,
    LowerAll,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReplacePiece {
    Text(String),
    WholeMatch,
    Group(usize),
    Case(CaseOp),
}

#[derive(Debug, Clone)]
pub struct ReplacePattern {
    pieces: Vec<ReplacePiece>,
}

#[derive(Debug, Clone, Copy)]
enum CaseMode {
    Upper,
    Lower,
}

#[derive(Default)]
struct CaseWriter {
    mode: Option<CaseMode>,
    one_shot: Option<CaseMode>,
}

impl CaseWriter {
    fn push_str(&mut self, out: &mut String, text: &str) {
        for c in text.chars() {
            let applied = self.one_shot.take().or(self.mode);
            match applied {
                Some(CaseMode::Upper) => out.extend(c.to_uppercase()),
                Some(CaseMode::Lower) => out.extend(c.to_lowercase()),
                None => out.push(c),
            }
        }
    }

    fn apply(&mut self, op: CaseOp) {
        match op {
            CaseOp::UpperFirst => self.one_shot = Some(CaseMode::Upper),
            CaseOp::LowerFirst => self.one_shot = Some(CaseMode::Lower),
            CaseOp::UpperAll => self.mode = Some(CaseMode::Upper),
            CaseOp::LowerAll => self.mode = Some(CaseMode::Lower),
            CaseOp::End => {
                self.mode = None;
                self.one_shot = None;
            }
        }
    }
}

impl ReplacePattern {
    pub fn parse(replace_string: &str) -> Self {
        let mut pieces = Vec::new();
        let mut text = String::new();
        let mut chars = replace_string.chars().peekable();

        fn flush(pieces: &mut Vec<ReplacePiece>, text: &mut String) {
            if !text.is_empty() {
                pieces.push(ReplacePiece::Text(std::mem::take(text)));
            }
        }

        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('\\') => text.push('\\'),
                    Some('u') => {
                        flush(&mut pieces, &mut text);
                        pieces.push(ReplacePiece::Case(CaseOp::UpperFirst));
                    }
                    Some('l') => {
                        flush(&mut pieces, &mut text);
                        pieces.push(ReplacePiece::Case(CaseOp::LowerFirst));
                    }
                    Some('U') => {
                        flush(&mut pieces, &mut text);
                        pieces.push(ReplacePiece::Case(CaseOp::UpperAll));
                    }
                    Some('L') => {
                        flush(&mut pieces, &mut text);
                        pieces.push(ReplacePiece::Case(CaseOp::LowerAll));
                    }
                    Some('E') => {
                        flush(&mut pieces, &mut text);
                        pieces.push(ReplacePiece::Case(CaseOp::End));
                    }
                    Some(other) => {
                        text.push('\\');
                        text.push(other);
                    }
                    None => text.push('\\'),
                },
                '$' => match chars.peek().copied() {
                    Some('$') => {
                        chars.next();
                        text.push('$');
                    }
                    Some('&') | Some('0') => {
                        chars.next();
                        flush(&mut pieces, &mut text);
                        pieces.push(ReplacePiece::WholeMatch);
                    }
                    Some(d1) if d1.is_ascii_digit() => {
                        chars.next();
                        let mut group = d1 as usize - '0' as usize;
                        if let Some(d2) = chars.peek().copied().filter(char::is_ascii_digit) {
                            chars.next();
                            group = group * 10 + (d2 as usize - '0' as usize);
                        }
                        flush(&mut pieces, &mut text);
                        pieces.push(ReplacePiece::Group(group));
                    }
                    _ => text.push('$'),
                },
                _ => text.push(c),
            }
        }
        flush(&mut pieces, &mut text);
        Self { pieces }
    }

    /// 针对单个匹配展开；`captures[0]` 为整体匹配
    pub fn expand(&self, matched: &str, captures: Option<&[Option<String>]>) -> String {
        let mut out = String::new();
        let mut writer = CaseWriter::default();

        let group_text = |n: usize| -> Option<&str> {
            captures
                .and_then(|caps| caps.get(n))
                .map(|g| g.as_deref().unwrap_or(""))
        };

        for piece in &self.pieces {
            match piece {
                ReplacePiece::Text(text) => writer.push_str(&mut out, text),
                ReplacePiece::WholeMatch => writer.push_str(&mut out, matched),
                ReplacePiece::Group(n) => {
                    if let Some(text) = group_text(*n) {
                        writer.push_str(&mut out, text);
                    } else if *n >= 10 {
                        // $NN 超出组数时退回 $N + 字面量数字
                        if let Some(text) = group_text(*n / 10) {
                            writer.push_str(&mut out, text);
                        }
                        let digit = (b'0' + (*n % 10) as u8) as char;
                        writer.push_str(&mut out, &digit.to_string());
                    }
                }
                ReplacePiece::Case(op) => writer.apply(*op),
            }
        }
        out
    }
}
