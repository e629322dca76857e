/*
Simple i18n helper for the backend.

This module provides:
- A tiny embedded translations store for EN/JA (compile-time embedded JSON).
- A simple `tr` function to lookup translations by key + optional params.
- `t` / `t_with` convenience wrappers using the default language (DEFAULT_LANG).

Usage:
    use crate::i18n;
    let msg = i18n::t("not_found.pet");
    let msg_with = i18n::t_with("validation.required", &[("field", "name")]);

Notes:
- Placeholders in translation strings use single-brace format: `{name}`.
- Default language is `en`. If a key is missing for the requested language,
  the fallback language will be used.
*/

use std::collections::HashMap;
use std::sync::OnceLock;

pub const DEFAULT_LANG: &str = "en";

static TRANSLATIONS: OnceLock<HashMap<String, HashMap<String, String>>> = OnceLock::new();

const EN_JSON: &str = r#"
{
  "validation.required": "{field} is required",
  "validation.non_negative": "{field} must be a non-negative number",
  "validation.level_out_of_range": "{field} must be between 1 and 5",
  "validation.invalid_choice": "{field} must be one of: {choices}",
  "validation.email_invalid": "Please enter a valid email address",
  "validation.password_too_short": "Password must be at least {min} characters",
  "validation.expiration_days_range": "expirationDays must be between 1 and {max}",
  "validation.end_before_start": "End date must not be before the start date",
  "validation.invalid_body": "Invalid request body: {reason}",
  "validation.invalid_link_url": "Link URL must start with http:// or https://",
  "validation.cannot_remove_self": "You cannot remove yourself. Use \"Leave Family\" instead.",
  "validation.unsupported_file_type": "Unsupported file type: {ext}",
  "validation.file_too_large": "File exceeds the maximum size of {max} bytes",
  "validation.missing_file": "A file field named \"file\" is required",
  "conflict.email_taken": "An account with this email already exists",
  "conflict.already_in_family": "You already belong to a family",
  "auth.invalid_credentials": "Invalid email or password",
  "not_found.pet": "Pet not found",
  "not_found.family": "Family not found",
  "not_found.member": "Family member not found",
  "not_found.record": "Record not found",
  "not_found.medication": "Medication not found",
  "not_found.share_token": "Share token not found",
  "not_found.share_link": "This share link is invalid or has expired",
  "not_found.food_product": "Food product not found",
  "not_found.banner": "Banner not found",
  "bad_request.token_id_required": "Token ID required",
  "pdf.footer": "Record Pet - Pet Management System",
  "app.name": "Record Pet"
}
"#;

const JA_JSON: &str = r#"
{
  "validation.required": "{field} は必須です",
  "validation.non_negative": "{field} には0以上の数値を入力してください",
  "validation.level_out_of_range": "{field} は1から5の範囲で指定してください",
  "validation.invalid_choice": "{field} は次のいずれかを指定してください: {choices}",
  "validation.email_invalid": "有効なメールアドレスを入力してください",
  "validation.password_too_short": "パスワードは{min}文字以上で入力してください",
  "validation.expiration_days_range": "有効期限は1日から{max}日の範囲で指定してください",
  "validation.end_before_start": "終了日は開始日以降の日付を指定してください",
  "validation.invalid_body": "リクエスト本文が不正です: {reason}",
  "validation.invalid_link_url": "リンクURLは http:// または https:// で始まる必要があります",
  "validation.cannot_remove_self": "自分自身は削除できません。「家族から退出」を使用してください。",
  "validation.unsupported_file_type": "サポートされていないファイル形式です: {ext}",
  "validation.file_too_large": "ファイルサイズが上限（{max}バイト）を超えています",
  "validation.missing_file": "\"file\" という名前のファイルが必要です",
  "conflict.email_taken": "このメールアドレスは既に登録されています",
  "conflict.already_in_family": "既に家族に所属しています",
  "auth.invalid_credentials": "メールアドレスまたはパスワードが正しくありません",
  "not_found.pet": "ペットが見つかりません",
  "not_found.family": "家族が見つかりません",
  "not_found.member": "家族メンバーが見つかりません",
  "not_found.record": "記録が見つかりません",
  "not_found.medication": "投薬記録が見つかりません",
  "not_found.share_token": "共有トークンが見つかりません",
  "not_found.share_link": "この共有リンクは無効か、有効期限が切れています",
  "not_found.food_product": "フード製品が見つかりません",
  "not_found.banner": "バナーが見つかりません",
  "bad_request.token_id_required": "トークンIDが必要です",
  "pdf.footer": "Record Pet - ペット管理システム",
  "app.name": "Record Pet"
}
"#;

/// Initialize translations map (lazy).
fn build_translations() -> HashMap<String, HashMap<String, String>> {
    let mut out: HashMap<String, HashMap<String, String>> = HashMap::new();

    let en_map: HashMap<String, String> = serde_json::from_str(EN_JSON).unwrap_or_else(|e| {
        panic!("failed to parse EN_JSON in i18n module: {}", e);
    });
    out.insert("en".to_string(), en_map);

    let ja_map: HashMap<String, String> = serde_json::from_str(JA_JSON).unwrap_or_else(|e| {
        panic!("failed to parse JA_JSON in i18n module: {}", e);
    });
    out.insert("ja".to_string(), ja_map);

    out
}

/// Returns the global translations map (lang -> (key -> message)).
fn translations() -> &'static HashMap<String, HashMap<String, String>> {
    TRANSLATIONS.get_or_init(build_translations)
}

/// Translate a key using an explicit language (or default if None).
///
/// Returns the translated and parameter-substituted string. If no translation is found,
/// returns the default language value or the key itself.
pub fn tr(lang: Option<&str>, key: &str, params: Option<&[(&str, &str)]>) -> String {
    let map = translations();

    let desired = lang.unwrap_or(DEFAULT_LANG);

    let val = map
        .get(desired)
        .and_then(|m| m.get(key))
        .cloned()
        .or_else(|| map.get(DEFAULT_LANG).and_then(|m| m.get(key)).cloned())
        .unwrap_or_else(|| key.to_string());

    if let Some(params) = params {
        let mut s = val;
        for (k, v) in params {
            s = s.replace(&format!("{{{}}}", k), v);
        }
        s
    } else {
        val
    }
}

/// Convenience wrapper: translate using default language (DEFAULT_LANG).
pub fn t(key: &str) -> String {
    tr(None, key, None)
}

/// Convenience wrapper with params (default language).
pub fn t_with(key: &str, params: &[(&str, &str)]) -> String {
    tr(None, key, Some(params))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tr_japanese() {
        let s = tr(Some("ja"), "not_found.pet", None);
        assert!(s.contains("ペット"));
    }

    #[test]
    fn test_t_with_params() {
        let s = t_with("validation.required", &[("field", "name")]);
        assert_eq!(s, "name is required");
    }

    #[test]
    fn test_fallback_to_default() {
        let s = tr(Some("fr"), "not_found.pet", None);
        assert_eq!(s, "Pet not found");
    }

    #[test]
    fn missing_key_returns_key() {
        let k = "non.existent.key";
        assert_eq!(t(k), k.to_string());
    }

    #[test]
    fn every_english_key_has_a_japanese_translation() {
        let map = translations();
        let en = &map["en"];
        let ja = &map["ja"];
        for key in en.keys() {
            assert!(ja.contains_key(key), "missing ja translation for {}", key);
        }
    }
}
