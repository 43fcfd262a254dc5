//! Fixed English → Russian tables for detector classes and grid locations.

/// Detector class names (COCO labels).
pub const CLASS_NAMES: &[(&str, &str)] = &[
    ("person", "человек"),
    ("car", "автомобиль"),
    ("bicycle", "велосипед"),
    ("motorcycle", "мотоцикл"),
    ("bus", "автобус"),
    ("truck", "грузовик"),
    ("train", "поезд"),
    ("boat", "лодка"),
    ("traffic light", "светофор"),
    ("fire hydrant", "пожарный гидрант"),
    ("stop sign", "знак стоп"),
    ("parking meter", "паркомат"),
    ("bench", "скамейка"),
    ("bird", "птица"),
    ("cat", "кот"),
    ("dog", "собака"),
    ("horse", "лошадь"),
    ("sheep", "овца"),
    ("cow", "корова"),
    ("elephant", "слон"),
    ("bear", "медведь"),
    ("zebra", "зебра"),
    ("giraffe", "жираф"),
    ("backpack", "рюкзак"),
    ("umbrella", "зонт"),
    ("handbag", "сумка"),
    ("tie", "галстук"),
    ("suitcase", "чемодан"),
    ("frisbee", "фрисби"),
    ("skis", "лыжи"),
    ("snowboard", "сноуборд"),
    ("sports ball", "мяч"),
    ("kite", "воздушный змей"),
    ("baseball bat", "бита"),
    ("baseball glove", "перчатка для бейсбола"),
    ("skateboard", "скейтборд"),
    ("surfboard", "серфборд"),
    ("tennis racket", "ракетка"),
    ("bottle", "бутылка"),
    ("wine glass", "бокал"),
    ("cup", "чашка"),
    ("fork", "вилка"),
    ("knife", "нож"),
    ("spoon", "ложка"),
    ("bowl", "миска"),
    ("banana", "банан"),
    ("apple", "яблоко"),
    ("sandwich", "сэндвич"),
    ("orange", "апельсин"),
    ("broccoli", "брокколи"),
    ("carrot", "морковь"),
    ("hot dog", "хот-дог"),
    ("pizza", "пицца"),
    ("donut", "пончик"),
    ("cake", "торт"),
    ("chair", "стул"),
    ("couch", "диван"),
    ("potted plant", "горшечное растение"),
    ("bed", "кровать"),
    ("dining table", "обеденный стол"),
    ("toilet", "туалет"),
    ("tv", "телевизор"),
    ("laptop", "ноутбук"),
    ("mouse", "мышь"),
    ("remote", "пульт"),
    ("keyboard", "клавиатура"),
    ("cell phone", "телефон"),
    ("microwave", "микроволновка"),
    ("oven", "духовка"),
    ("toaster", "тостер"),
    ("sink", "раковина"),
    ("refrigerator", "холодильник"),
    ("book", "книга"),
    ("clock", "часы"),
    ("vase", "ваза"),
    ("scissors", "ножницы"),
    ("teddy bear", "плюшевый мишка"),
    ("hair drier", "фен"),
    ("toothbrush", "зубная щётка"),
];

/// Grid location phrases, applied in order. Longer phrases must come before
/// the single words they contain.
pub const LOCATION_PHRASES: &[(&str, &str)] = &[
    ("entire image", "всё изображение"),
    ("entire upper", "вся верхняя часть"),
    ("entire lower", "вся нижняя часть"),
    ("entire left", "вся левая часть"),
    ("entire right", "вся правая часть"),
    ("entire middle", "вся средняя часть"),
    ("entire center", "вся центральная часть"),
    ("upper left area", "верхняя левая часть"),
    ("upper right area", "верхняя правая часть"),
    ("lower left area", "нижняя левая часть"),
    ("lower right area", "нижняя правая часть"),
    ("upper half", "верхняя половина"),
    ("lower half", "нижняя половина"),
    ("left half", "левая половина"),
    ("right half", "правая половина"),
    ("center area", "центр"),
    ("upper area", "верхняя часть"),
    ("lower area", "нижняя часть"),
    ("left area", "левая часть"),
    ("right area", "правая часть"),
    ("upper", "верхняя"),
    ("center", "центр"),
    ("lower", "нижняя"),
    ("left", "левая"),
    ("middle", "средняя"),
    ("right", "правая"),
];

/// Translate a class name; unknown names pass through unchanged.
pub fn translate_class(name: &str) -> String {
    let key = name.to_lowercase();
    CLASS_NAMES
        .iter()
        .find(|(en, _)| *en == key)
        .map(|(_, ru)| (*ru).to_string())
        .unwrap_or_else(|| name.to_string())
}

/// Translate a location descriptor by ordered substring replacement.
pub fn translate_location(src: &str) -> String {
    LOCATION_PHRASES
        .iter()
        .fold(src.to_string(), |acc, (en, ru)| acc.replace(en, ru))
}
