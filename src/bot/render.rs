use crate::bot::callback::CallbackAction;
use crate::bot::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, ReplyKeyboardMarkup, ReplyMarkup,
};
use crate::catalog::BrandPage;
use crate::models::{Category, Listing};

pub const BUTTON_ALL: &str = "🔍 Все автомобили";
pub const BUTTON_NEW: &str = "🚘 Новые";
pub const BUTTON_RETRO: &str = "🚗 Ретро";
pub const BUTTON_CHILDREN: &str = "👶 Детские";
pub const BUTTON_HELP: &str = "ℹ️ Помощь";

pub const SEARCHING_TEXT: &str = "⏳ Ищу доступные марки автомобилей...";
pub const USE_MENU_TEXT: &str = "Пожалуйста, используйте кнопки меню.";
pub const BRAND_NOT_FOUND_TEXT: &str = "Не удалось найти автомобили этой марки";
pub const DONE_TEXT: &str = "✅ Загрузка завершена! Выберите следующее действие:";

pub const WELCOME_TEXT: &str = "<b>Мы - Сообщество автомобильных энтузиастов прекрасно понимаем: иногда нужно купить авто сразу, а иногда – найти именно ту уникальную модель, которая покорила ваше сердце.</b>

• Готовые решения: На нашем складе и площадках всегда представлен тщательно подобранный парк автомобилей из наличия. Это проверенные, подготовленные к передаче машины различных марок, моделей и комплектаций.
• Экономия времени: Не хотите или не можете ждать? Выбирайте из готовых вариантов! Осмотрите, протестируйте и уезжайте за рулем своего нового авто буквально в день обращения.
• Прозрачность и гарантии: Каждое авто из наличия проходит предпродажную подготовку. Мы предоставляем полную информацию о состоянии и истории автомобиля.


Загляните в наш каталог – ваш идеальный автомобиль, возможно, уже ждет вас!

<b>Основные функции:</b>

• <b>Все автомобили</b> - объединенный поиск по всем доступным автомобилям
• <b>Новые</b> - просмотр новых премиальных автомобилей
• <b>Ретро</b> - просмотр классических автомобилей
• <b>Детские</b> - просмотр детских автомобилей

Нажмите на кнопку ниже для начала поиска.";

pub const NO_CHILDREN_TEXT: &str = "ℹ️ В настоящее время в категории \"Детские\" нет доступных моделей.

Проверьте, пожалуйста, позже. Возможно, информация обновится.

Вы можете вернуться в главное меню:";

pub const LOAD_FAILED_TEXT: &str = "❌ Не удалось загрузить список автомобилей.

Возможные причины:
1. Сайты временно недоступны
2. Структура сайтов изменилась
3. Требуется обновление парсера

Попробуйте позже или свяжитесь с поддержкой.";

pub fn help_text(contact_phone: &str) -> String {
    format!(
        "<b>ℹ️ Помощь по использованию бота</b>


<b>Как использовать:</b>
1. Нажмите на кнопку \"Все автомобили\", \"Новые\", \"Ретро\" или \"Детские\"
2. Выберите интересующую вас марку
3. Получите информацию об автомобилях


<b>Важно:</b>
• Бот показывает только автомобили, которые находятся в наличии
• Каждый автомобиль отображается в отдельном сообщении с фото (если доступно)
• Для уточнения деталей используйте ссылки на сайт

☎️ <b>{}</b> (WhatsApp, Telegram)

Для начала работы нажмите /start",
        escape_html(contact_phone)
    )
}

pub fn main_keyboard() -> ReplyMarkup {
    let button = |text: &str| KeyboardButton { text: text.to_string() };

    ReplyMarkup::Keyboard(ReplyKeyboardMarkup {
        keyboard: vec![
            vec![button(BUTTON_ALL)],
            vec![button(BUTTON_NEW), button(BUTTON_RETRO), button(BUTTON_CHILDREN)],
            vec![button(BUTTON_HELP)],
        ],
        resize_keyboard: true,
    })
}

fn category_heading(category: Option<Category>) -> &'static str {
    match category {
        Some(Category::Retro) => "ретро автомобилей",
        Some(Category::New) => "новых автомобилей",
        Some(Category::Children) => "детских автомобилей",
        None => "автомобилей",
    }
}

pub fn brand_menu_text(page: &BrandPage, category: Option<Category>) -> String {
    let mut text = format!(
        "<b>🔤 Доступные марки {} (страница {} из {}):</b>\n\n",
        category_heading(category),
        page.page,
        page.total_pages
    );

    for (i, group) in page.groups.iter().enumerate() {
        text.push_str(&format!(
            "{}. <b>{}</b> - {} моделей\n",
            page.offset + i + 1,
            escape_html(&group.display_name),
            group.listings.len()
        ));
    }

    text.push_str("\nВыберите марку из списка ниже:");
    text
}

pub fn brand_menu_keyboard(page: &BrandPage, category: Option<Category>) -> ReplyMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = page
        .groups
        .iter()
        .map(|group| {
            vec![InlineKeyboardButton {
                text: format!("{} ({})", group.display_name, group.listings.len()),
                callback_data: CallbackAction::Brand {
                    key: group.key.clone(),
                    category,
                }
                .encode(),
            }]
        })
        .collect();

    let mut navigation = Vec::new();
    if page.page > 1 {
        navigation.push(InlineKeyboardButton {
            text: "◀️ Назад".to_string(),
            callback_data: CallbackAction::Page { page: page.page - 1, category }.encode(),
        });
    }
    if page.page < page.total_pages {
        navigation.push(InlineKeyboardButton {
            text: "Вперед ▶️".to_string(),
            callback_data: CallbackAction::Page { page: page.page + 1, category }.encode(),
        });
    }
    if !navigation.is_empty() {
        rows.push(navigation);
    }

    ReplyMarkup::Inline(InlineKeyboardMarkup { inline_keyboard: rows })
}

pub fn brand_heading(display_name: &str) -> String {
    format!("🚗 <b>Автомобили марки {}:</b>", escape_html(display_name))
}

/// Card text for one listing; `index` is 1-based
pub fn listing_caption(listing: &Listing, index: usize, contact_phone: &str) -> String {
    let mut caption = format!("<b>#{} {}</b>\n\n", index, escape_html(&listing.name));

    // Only new cars ever come with a meaningful year
    if listing.category == Category::New && listing.has_year() {
        caption.push_str(&format!("📅 <b>Год выпуска:</b> {}\n", escape_html(&listing.year)));
    }

    caption.push_str(&format!("📍 <b>Наличие:</b> {}\n", escape_html(&listing.location)));
    caption.push_str(&format!("💰 <b>Цена:</b> {}", escape_html(&listing.price)));

    if !listing.link.is_empty() {
        caption.push_str(&format!(
            "\n\n🔗 <a href='{}'>Подробнее на сайте</a>",
            escape_html(&listing.link)
        ));
    }

    caption.push_str(&format!("\n\n☎️ <b>{}</b> (WhatsApp, Telegram)", escape_html(contact_phone)));
    caption
}

pub fn photo_fallback(caption: &str) -> String {
    format!("⚠️ Фото недоступно\n\n{caption}")
}

pub fn error_text(error: &anyhow::Error) -> String {
    format!("❌ Произошла ошибка: {}", escape_html(&error.to_string()))
}

/// All bot copy is sent as HTML, so dynamic text goes through here first
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{group_by_brand, paginate};
    use crate::models::Source;
    use crate::scrapers::aggregator::testing::listing;

    fn brands(count: usize) -> Vec<Listing> {
        (0..count)
            .map(|i| listing(&format!("Brand{i:02}"), "Model", Source::Antiqcar, Category::Retro))
            .collect()
    }

    #[test]
    fn test_menu_text_numbers_across_pages() {
        let page = paginate(group_by_brand(brands(16)), 2);

        let text = brand_menu_text(&page, Some(Category::Retro));

        assert!(text.starts_with("<b>🔤 Доступные марки ретро автомобилей (страница 2 из 2):</b>"));
        assert!(text.contains("16. <b>Brand15</b> - 1 моделей\n"));
        assert!(text.ends_with("Выберите марку из списка ниже:"));
    }

    #[test]
    fn test_keyboard_navigation_rows() {
        let groups = group_by_brand(brands(31));

        let ReplyMarkup::Inline(first) = brand_menu_keyboard(&paginate(groups.clone(), 1), None) else {
            panic!("expected inline keyboard");
        };
        let ReplyMarkup::Inline(middle) = brand_menu_keyboard(&paginate(groups.clone(), 2), None) else {
            panic!("expected inline keyboard");
        };
        let ReplyMarkup::Inline(single) = brand_menu_keyboard(&paginate(group_by_brand(brands(2)), 1), None)
        else {
            panic!("expected inline keyboard");
        };

        let first_nav = first.inline_keyboard.last().unwrap();
        assert_eq!(first.inline_keyboard.len(), 16);
        assert_eq!(first_nav.len(), 1);
        assert_eq!(first_nav[0].callback_data, "page:2:all");

        let middle_nav = middle.inline_keyboard.last().unwrap();
        assert_eq!(middle_nav.len(), 2);
        assert_eq!(middle_nav[0].text, "◀️ Назад");
        assert_eq!(middle_nav[1].text, "Вперед ▶️");

        assert_eq!(single.inline_keyboard.len(), 2);
        assert_eq!(single.inline_keyboard[0][0].text, "Brand00 (1)");
        assert_eq!(single.inline_keyboard[0][0].callback_data, "brand:all:brand00");
    }

    #[test]
    fn test_caption_layout() {
        let mut car = listing("Ford", "Ford Mustang <GT>", Source::Antiqcar, Category::Retro);
        car.link = "https://antiqcar.ru/market/1".to_string();

        let caption = listing_caption(&car, 3, "+70000000000");

        assert_eq!(
            caption,
            "<b>#3 Ford Mustang &lt;GT&gt;</b>\n\n\
             📍 <b>Наличие:</b> В наличии в Москве\n\
             💰 <b>Цена:</b> 1 000 000 ₽\n\n\
             🔗 <a href='https://antiqcar.ru/market/1'>Подробнее на сайте</a>\n\n\
             ☎️ <b>+70000000000</b> (WhatsApp, Telegram)"
        );
    }

    #[test]
    fn test_caption_shows_year_only_for_new_cars_with_year() {
        let mut car = listing("BMW", "BMW X5", Source::Antarmotors, Category::New);
        assert!(!listing_caption(&car, 1, "+7").contains("Год выпуска"));

        car.year = "2023".to_string();
        assert!(listing_caption(&car, 1, "+7").contains("📅 <b>Год выпуска:</b> 2023"));

        car.category = Category::Retro;
        assert!(!listing_caption(&car, 1, "+7").contains("Год выпуска"));
    }

    #[test]
    fn test_caption_without_link() {
        let car = listing("Ford", "Ford T", Source::Antiqcar, Category::Retro);
        assert!(!listing_caption(&car, 1, "+7").contains("Подробнее"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"A&B <i>"x"</i> 'y'"#), "A&amp;B &lt;i&gt;&quot;x&quot;&lt;/i&gt; &#39;y&#39;");
    }
}
