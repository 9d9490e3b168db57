//! Prompt templates, all Ukrainian. Word limits keep the output channel- and
//! chat-sized; tarot prompts ask for a `*[Назва Карти]*` marker so the card
//! name can be pulled back out of the reply.

use crate::domain::ReadingKind;

pub fn serious_horoscope(sign: &str) -> String {
    format!(
        "Склади інформативний, нейтральний прогноз на завтра для знаку зодіаку {sign} \
         українською мовою. Без надміру емодзі та сленгу. Довжина не більше 35 слів."
    )
}

pub fn funny_horoscope(sign: &str) -> String {
    format!(
        "Склади кумедний, іронічний, короткий прогноз на сьогодні для знаку зодіаку {sign} \
         українською. Одне лаконічне речення. Не більше 20 слів."
    )
}

pub fn weekly_horoscope(sign: &str) -> String {
    format!(
        "Склади короткий прогноз на цей тиждень для знаку зодіаку {sign} українською мовою. \
         Що принесе тиждень у справах, стосунках і настрої. Не більше 35 слів."
    )
}

pub fn tarot_card(excluded: &[String]) -> String {
    let mut p = String::from(
        "Витягни одну випадкову карту Таро і склади передбачення дня за нею українською мовою. \
         Не більше 70 слів. Формат: *[Назва Карти]* — далі текст передбачення.",
    );
    if !excluded.is_empty() {
        p.push_str(&format!(
            " Карта НЕ ПОВИННА бути однією з цих: {}.",
            excluded.join(", ")
        ));
    }
    p
}

pub fn tarot_analysis(excluded: &[String]) -> String {
    let mut p = String::from(
        "Зроби глибокий вечірній розбір однієї карти Таро українською мовою: значення, \
         символіка, порада на вечір. Не більше 120 слів. Формат: *[Назва Карти]* — далі \
         текст розбору.",
    );
    if !excluded.is_empty() {
        p.push_str(&format!(
            " НЕ використовуй карту з назвою зі списку: {}.",
            excluded.join(", ")
        ));
    }
    p
}

pub fn compatibility(first: &str, second: &str) -> String {
    format!(
        "Склади гороскоп сумісності пари знаків {first} та {second} українською мовою: \
         кохання, дружба, робота. Не більше 150 слів."
    )
}

pub fn numerology(number: u32, date_text: &str) -> String {
    format!(
        "Число дня — {number}. Склади нумерологічний прогноз для цього числа на {date_text} \
         українською мовою. Не більше 80 слів."
    )
}

pub fn daily_wish(date_text: &str) -> String {
    format!(
        "Склади тепле коротке побажання гарного дня на {date_text} українською мовою. \
         Не більше 25 слів."
    )
}

pub fn personal_reading(kind: ReadingKind) -> String {
    match kind {
        ReadingKind::Day => "Зроби індивідуальний розклад Таро на день: витягни одну карту \
             і опиши, що вона означає для людини сьогодні. Українською мовою, не більше \
             100 слів. Формат: *[Назва Карти]* — далі текст."
            .to_string(),
        ReadingKind::Week => "Зроби індивідуальний розклад Таро на тиждень: витягни ТРИ карти \
             (минуле, теперішнє, майбутнє тижня) і коротко опиши кожну. Українською мовою, \
             не більше 150 слів. Формат першої карти: *[Назва Карти]*."
            .to_string(),
        ReadingKind::Month => "Зроби індивідуальний розклад Таро на місяць: витягни ОДНУ \
             ключову карту місяця і розгорнуто опиши її вплив. Українською мовою, не більше \
             200 слів. Формат: *[Назва Карти]* — далі текст."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tarot_prompt_lists_used_cards_only_when_present() {
        assert!(!tarot_card(&[]).contains("НЕ ПОВИННА"));
        let p = tarot_card(&["Маг".to_string(), "Сонце".to_string()]);
        assert!(p.contains("Карта НЕ ПОВИННА бути однією з цих: Маг, Сонце."));
    }

    #[test]
    fn analysis_prompt_excludes_used_cards() {
        let p = tarot_analysis(&["Вежа".to_string()]);
        assert!(p.contains("НЕ використовуй карту з назвою зі списку: Вежа."));
    }

    #[test]
    fn personal_prompts_scale_with_the_period() {
        assert!(personal_reading(ReadingKind::Day).contains("на день"));
        assert!(personal_reading(ReadingKind::Week).contains("ТРИ карти"));
        assert!(personal_reading(ReadingKind::Month).contains("на місяць"));
    }

    #[test]
    fn numerology_prompt_carries_the_number() {
        assert!(numerology(11, "23 серпня").contains("Число дня — 11"));
    }
}
